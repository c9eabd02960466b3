//! Host-side bridge script.
//!
//! The script is what runs inside LibreSprite: it polls
//! `/hosts/{session}/poll`, evaluates each [`PendingScript`] with a fresh
//! console capture and posts the [`ScriptResult`] back.
//!
//! [`PendingScript`]: rusty_sprite_core::protocol::PendingScript
//! [`ScriptResult`]: rusty_sprite_core::protocol::ScriptResult

const BRIDGE_TEMPLATE: &str = include_str!("bridge.js");

/// Render the bridge for one relay address and session.
pub fn bridge_script(relay_url: &str, session: &str) -> String {
    let base = format!("{}/hosts/{}", relay_url.trim_end_matches('/'), session);
    // A JSON string is a valid JS string literal once the line separators are escaped
    let literal = serde_json::Value::String(base)
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029");
    BRIDGE_TEMPLATE.replace("__RELAY_BASE__", &literal)
}

#[cfg(test)]
mod tests {
    use rusty_sprite_core::protocol::{PendingScript, ScriptResult};
    use rusty_sprite_scripts::Operation;
    use rusty_sprite_scripts::host_stub::HostStub;

    use super::*;

    const FAKE_TRANSPORT: &str = r#"
        var transport = {
            queue: [],
            gets: [],
            posts: [],
            get: function (url) {
                this.gets.push(url);
                return this.queue.length ? this.queue.shift() : '';
            },
            post: function (url, body) {
                this.posts.push({ url: url, body: body });
            }
        };
    "#;

    fn loaded_host() -> HostStub {
        let mut host = HostStub::with_sprite(4, 4);
        let loaded = host.eval(&bridge_script("http://127.0.0.1:64823/", "studio"));
        assert!(loaded.error.is_none(), "bridge failed to load: {:?}", loaded.error);
        let transport = host.eval(FAKE_TRANSPORT);
        assert!(transport.error.is_none());
        host
    }

    fn queue(host: &mut HostStub, id: &str, script: &str) {
        let pending = serde_json::to_string(&PendingScript {
            id: id.into(),
            script: script.into(),
        })
        .unwrap();
        let literal = serde_json::Value::String(pending).to_string();
        host.query(&format!("transport.queue.push({literal})"));
    }

    fn posted(host: &mut HostStub, index: usize) -> ScriptResult {
        let body = host.query(&format!("transport.posts[{index}].body"));
        serde_json::from_str(&body).unwrap()
    }

    #[test]
    fn test_urls_address_the_session() {
        let mut host = loaded_host();
        assert_eq!(
            host.query("__rustySpriteBridge.pollUrl"),
            "http://127.0.0.1:64823/hosts/studio/poll"
        );
        assert_eq!(
            host.query("__rustySpriteBridge.resultUrl"),
            "http://127.0.0.1:64823/hosts/studio/result"
        );
    }

    #[test]
    fn test_idle_poll_posts_nothing() {
        let mut host = loaded_host();
        assert_eq!(host.query("__rustySpriteBridge.tick(transport)"), "false");
        assert_eq!(host.query("transport.gets.length"), "1");
        assert_eq!(host.query("transport.posts.length"), "0");
    }

    #[test]
    fn test_each_result_holds_only_its_own_output() {
        let mut host = loaded_host();
        host.eval("console.log('printed before the bridge ran');");
        queue(&mut host, "a", "console.log('first');");
        queue(&mut host, "b", "console.log('second', 2);");

        assert_eq!(host.query("__rustySpriteBridge.tick(transport)"), "true");
        assert_eq!(host.query("__rustySpriteBridge.tick(transport)"), "true");

        let first = posted(&mut host, 0);
        assert_eq!(first.id, "a");
        assert_eq!(first.output, "first");
        assert!(first.error.is_none());
        assert_eq!(posted(&mut host, 1).output, "second 2");
        assert_eq!(
            host.query("transport.posts[0].url"),
            "http://127.0.0.1:64823/hosts/studio/result"
        );
    }

    #[test]
    fn test_uncaught_error_keeps_partial_output() {
        let mut host = loaded_host();
        queue(&mut host, "c", "console.log('before'); notDefined();");
        host.query("__rustySpriteBridge.tick(transport)");

        let result = posted(&mut host, 0);
        assert_eq!(result.output, "before");
        assert!(result.error.as_deref().unwrap_or("").contains("notDefined"));
        assert!(result.into_text().starts_with("before\nScript error: "));
    }

    #[test]
    fn test_generated_script_runs_through_bridge() {
        let mut host = loaded_host();
        queue(&mut host, "info", &Operation::GetSpriteInfo.render());
        host.query("__rustySpriteBridge.tick(transport)");

        let result = posted(&mut host, 0);
        assert!(result.error.is_none(), "{:?}", result.error);
        assert!(result.output.starts_with("=== SPRITE INFO ==="));
    }
}
