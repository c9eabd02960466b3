//! Shape drawing scripts. Every pixel write is bounds-checked in the script,
//! so shapes may hang off the edge of the image.

use crate::color::Rgba;
use crate::js::{Requires, bool_literal, guarded};

pub fn fill_layer(color: Rgba) -> String {
    let host_color = color.host_expr();
    let body = format!(
        r#"const fillColor = {host_color};
img.clear(fillColor);
console.log('Filled active layer with color {color}');"#
    );
    guarded("filling layer", Requires::Image, &body)
}

pub fn draw_rectangle(x: i32, y: i32, width: u32, height: u32, color: Rgba, filled: bool) -> String {
    let host_color = color.host_expr();
    let filled = bool_literal(filled);
    let body = format!(
        r#"const rectColor = {host_color};
const x = {x};
const y = {y};
const width = {width};
const height = {height};
const filled = {filled};
const plot = function (px, py) {{
    if (px >= 0 && px < img.width && py >= 0 && py < img.height) {{
        img.putPixel(px, py, rectColor);
    }}
}};

if (filled) {{
    for (let py = y; py < y + height; py++) {{
        for (let px = x; px < x + width; px++) {{
            plot(px, py);
        }}
    }}
}} else if (width > 0 && height > 0) {{
    const right = x + width - 1;
    const bottom = y + height - 1;
    // Top and bottom rows
    for (let px = x; px <= right; px++) {{
        plot(px, y);
        if (bottom !== y) {{
            plot(px, bottom);
        }}
    }}
    // Left and right columns, corners already drawn
    for (let py = y + 1; py < bottom; py++) {{
        plot(x, py);
        if (right !== x) {{
            plot(right, py);
        }}
    }}
}}

console.log('Drew ' + (filled ? 'filled' : 'outlined') + ' rectangle at (' + x + ',' + y + ') size ' + width + 'x' + height);"#
    );
    guarded("drawing rectangle", Requires::Image, &body)
}

pub fn draw_circle(center_x: i32, center_y: i32, radius: u32, color: Rgba, filled: bool) -> String {
    let host_color = color.host_expr();
    let filled = bool_literal(filled);
    let body = format!(
        r#"const circleColor = {host_color};
const cx = {center_x};
const cy = {center_y};
const radius = {radius};
const filled = {filled};

for (let y = cy - radius; y <= cy + radius; y++) {{
    for (let x = cx - radius; x <= cx + radius; x++) {{
        if (x >= 0 && x < img.width && y >= 0 && y < img.height) {{
            const dx = x - cx;
            const dy = y - cy;
            const distance = Math.sqrt(dx * dx + dy * dy);
            if (filled ? distance <= radius : Math.abs(distance - radius) < 1) {{
                img.putPixel(x, y, circleColor);
            }}
        }}
    }}
}}

console.log('Drew ' + (filled ? 'filled' : 'outlined') + ' circle at (' + cx + ',' + cy + ') radius ' + radius);"#
    );
    guarded("drawing circle", Requires::Image, &body)
}

pub fn draw_ellipse(center_x: i32, center_y: i32, width: u32, height: u32, color: Rgba, filled: bool) -> String {
    let host_color = color.host_expr();
    let filled = bool_literal(filled);
    let body = format!(
        r#"const ellipseColor = {host_color};
const cx = {center_x};
const cy = {center_y};
const width = {width};
const height = {height};
const filled = {filled};
const a = width / 2;
const b = height / 2;

for (let y = cy - Math.ceil(b); y <= cy + Math.ceil(b); y++) {{
    for (let x = cx - Math.ceil(a); x <= cx + Math.ceil(a); x++) {{
        if (x >= 0 && x < img.width && y >= 0 && y < img.height) {{
            const dx = x - cx;
            const dy = y - cy;
            const ellipseEq = (dx * dx) / (a * a) + (dy * dy) / (b * b);
            if (filled ? ellipseEq <= 1 : Math.abs(ellipseEq - 1) < 0.1) {{
                img.putPixel(x, y, ellipseColor);
            }}
        }}
    }}
}}

console.log('Drew ' + (filled ? 'filled' : 'outlined') + ' ellipse at (' + cx + ',' + cy + ') size ' + width + 'x' + height);"#
    );
    guarded("drawing ellipse", Requires::Image, &body)
}

pub fn draw_line(x1: i32, y1: i32, x2: i32, y2: i32, color: Rgba, thickness: u32) -> String {
    let host_color = color.host_expr();
    let body = format!(
        r#"const lineColor = {host_color};
const x1 = {x1};
const y1 = {y1};
const x2 = {x2};
const y2 = {y2};
const thickness = {thickness};
const reach = Math.floor(thickness / 2);
const radiusSq = (thickness / 2) * (thickness / 2);
const stamp = function (px, py) {{
    if (px >= 0 && px < img.width && py >= 0 && py < img.height) {{
        img.putPixel(px, py, lineColor);
    }}
}};

// Bresenham
const dx = Math.abs(x2 - x1);
const dy = Math.abs(y2 - y1);
const sx = x1 < x2 ? 1 : -1;
const sy = y1 < y2 ? 1 : -1;
let err = dx - dy;
let x = x1;
let y = y1;

while (true) {{
    if (thickness > 1) {{
        for (let ty = -reach; ty <= reach; ty++) {{
            for (let tx = -reach; tx <= reach; tx++) {{
                if (tx * tx + ty * ty <= radiusSq) {{
                    stamp(x + tx, y + ty);
                }}
            }}
        }}
    }} else {{
        stamp(x, y);
    }}

    if (x === x2 && y === y2) {{
        break;
    }}
    const e2 = 2 * err;
    if (e2 > -dy) {{
        err -= dy;
        x += sx;
    }}
    if (e2 < dx) {{
        err += dx;
        y += sy;
    }}
}}

console.log('Drew line from (' + x1 + ',' + y1 + ') to (' + x2 + ',' + y2 + ') thickness ' + thickness);"#
    );
    guarded("drawing line", Requires::Image, &body)
}
