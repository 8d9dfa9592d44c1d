//! Notification email rendering.

use super::summary::ResolvedAppSummary;

/// Subject suffix identifying delivery-failure alerts.
pub const SUBJECT_MARKER: &str = "Event delivery failure(s)";

/// Subject line for an application's alert.
pub fn subject(display_name: &str) -> String {
    format!("Alert! {} - {} - Integration Hub", display_name, SUBJECT_MARKER)
}

/// HTML body for an application's alert.
pub fn render_html(app: &ResolvedAppSummary) -> String {
    let subscriptions = app
        .summary
        .subscriptions
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; font-size: 14px;">
    <p>Hello {app_name} team,</p>
    <p>
      In the last hour the Integration Hub could not deliver
      <strong>{count}</strong> event(s) to <strong>{app_name}</strong>.
    </p>
    <p>Affected subscriptions: {subscriptions}</p>
    <p>
      Failed events are retained for 60 days. Review them in the Integration
      Hub portal and contact the integration team if you need them replayed.
    </p>
    <p>Regards,<br/>Integration Hub</p>
  </body>
</html>
"#,
        app_name = escape_html(&app.display_name),
        count = app.summary.failed_events_count,
        subscriptions = escape_html(&subscriptions),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
