use crate::engine::BlockOutcome;
use crate::schema::{
    ClientSideAction, ClientSideActionKind, RedirectAction, RedirectOptions, SessionState,
};
use crate::variables::{ParseOptions, parse_variables};

pub fn execute_redirect(state: &SessionState, options: &RedirectOptions) -> BlockOutcome {
    let Some(url) = options.url.as_deref().filter(|url| !url.trim().is_empty()) else {
        return BlockOutcome::new();
    };
    let url = sanitize_url(&parse_variables(
        state.variables(),
        url,
        &ParseOptions::default(),
    ));
    BlockOutcome::new().with_action(ClientSideAction::new(ClientSideActionKind::Redirect(
        RedirectAction {
            url,
            is_new_tab: options.is_new_tab,
        },
    )))
}

/// Adds `https://` unless the URL already carries a scheme the client knows.
pub fn sanitize_url(url: &str) -> String {
    let url = url.trim();
    if ["http", "mailto:", "tel:", "sms:"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
    {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
