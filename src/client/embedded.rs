use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, rewrite_str, text};
use tracing::debug;

use crate::application::ssr::{INITIAL_DATA_GLOBAL, SsrContext};

const TARGET: &str = "inkblog::client::embedded";

/// The context a server render embedded in its page.
pub struct EmbeddedContext;

impl EmbeddedContext {
    /// Read the embedded context out of a served document.
    ///
    /// Absent or malformed payloads yield an empty context, which makes every
    /// component fall back to fetching.
    pub fn extract(html: &str) -> SsrContext {
        match Self::script_payload(html) {
            Some(payload) => Self::parse_payload(&payload).unwrap_or_else(|| {
                debug!(target: TARGET, "embedded context is malformed; ignoring it");
                SsrContext::new()
            }),
            None => SsrContext::new(),
        }
    }

    fn parse_payload(script: &str) -> Option<SsrContext> {
        let assignment = script.trim().strip_prefix(INITIAL_DATA_GLOBAL)?;
        let json = assignment.trim_start().strip_prefix('=')?.trim();
        let json = json.strip_suffix(';').unwrap_or(json);
        serde_json::from_str(json).ok()
    }

    fn script_payload(html: &str) -> Option<String> {
        let scripts: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let current = Rc::new(RefCell::new(String::new()));

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![text!("script", {
                    let scripts = Rc::clone(&scripts);
                    let current = Rc::clone(&current);
                    move |chunk| {
                        current.borrow_mut().push_str(chunk.as_str());
                        if chunk.last_in_text_node() {
                            let body = std::mem::take(&mut *current.borrow_mut());
                            scripts.borrow_mut().push(body);
                        }
                        Ok(())
                    }
                })],
                ..RewriteStrSettings::default()
            },
        )
        .ok()?;

        let found = scripts
            .borrow()
            .iter()
            .find(|body| body.trim_start().starts_with(INITIAL_DATA_GLOBAL))
            .cloned();
        found
    }
}
