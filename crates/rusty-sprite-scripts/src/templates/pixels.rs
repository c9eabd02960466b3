//! Per-pixel scripts: single writes, flood fill, color replacement.

use crate::color::{Rgb, Rgba};
use crate::js::{Requires, guarded};

pub fn put_pixel(x: i32, y: i32, color: Rgba) -> String {
    let host_color = color.host_expr();
    let body = format!(
        r#"const x = {x};
const y = {y};
if (x < 0 || x >= img.width || y < 0 || y >= img.height) {{
    console.log('Pixel coordinates (' + x + ',' + y + ') are out of bounds');
    return;
}}

img.putPixel(x, y, {host_color});
console.log('Set pixel at (' + x + ',' + y + ') to {color}');"#
    );
    guarded("setting pixel", Requires::Image, &body)
}

/// Explicit-stack 4-connected fill; region size never touches the host's call stack.
pub fn flood_fill(x: i32, y: i32, color: Rgba) -> String {
    let host_color = color.host_expr();
    let body = format!(
        r#"const startX = {x};
const startY = {y};
if (startX < 0 || startX >= img.width || startY < 0 || startY >= img.height) {{
    console.log('Start coordinates (' + startX + ',' + startY + ') are out of bounds');
    return;
}}

const fillColor = {host_color};
const targetColor = img.getPixel(startX, startY);
if (targetColor === fillColor) {{
    console.log('Target color is the same as fill color, no action needed');
    return;
}}

const stack = [[startX, startY]];
let fillCount = 0;
while (stack.length > 0) {{
    const point = stack.pop();
    const px = point[0];
    const py = point[1];
    if (px < 0 || px >= img.width || py < 0 || py >= img.height) {{
        continue;
    }}
    if (img.getPixel(px, py) !== targetColor) {{
        continue;
    }}

    img.putPixel(px, py, fillColor);
    fillCount++;

    stack.push([px + 1, py]);
    stack.push([px - 1, py]);
    stack.push([px, py + 1]);
    stack.push([px, py - 1]);
}}

console.log('Flood fill completed at (' + startX + ',' + startY + '), filled ' + fillCount + ' pixels');"#
    );
    guarded("flood filling", Requires::Image, &body)
}

/// Matches on red, green and blue only; the existing alpha is ignored.
pub fn replace_color(old: Rgb, new: Rgba) -> String {
    let host_color = new.host_expr();
    let Rgb { r, g, b } = old;
    let body = format!(
        r#"const col = app.pixelColor;
const newColor = {host_color};
let replacedCount = 0;

for (let y = 0; y < img.height; y++) {{
    for (let x = 0; x < img.width; x++) {{
        const pixelColor = img.getPixel(x, y);
        if (col.rgbaR(pixelColor) === {r} &&
            col.rgbaG(pixelColor) === {g} &&
            col.rgbaB(pixelColor) === {b}) {{
            img.putPixel(x, y, newColor);
            replacedCount++;
        }}
    }}
}}

console.log('Replaced ' + replacedCount + ' pixels from {old} to {new}');"#
    );
    guarded("replacing color", Requires::Image, &body)
}
