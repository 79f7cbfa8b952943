// Response helpers for the callback handler: the self-redirecting HTML page
// and redirect-URL composition.
//
// Mobile browser shells differ in which navigation call actually hands
// control back to the app, so the page tries several strategies in
// sequence. The sequence is data (`RedirectStep` list) so the policy can be
// tuned and tested without touching control flow.

/// One redirect attempt kind the page can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStrategy {
    /// `window.location.href = url`
    Navigate,
    /// `window.location.replace(url)`
    Replace,
    /// `window.open(url, '_self')`
    OpenSelf,
    /// `window.close()` after earlier attempts have fired
    Close,
}

/// A redirect attempt scheduled after `delay_ms`
#[derive(Debug, Clone, Copy)]
pub struct RedirectStep {
    pub delay_ms: u32,
    pub strategy: RedirectStrategy,
}

/// Default strategy sequence, tuned against Android Custom Tabs, iOS
/// SFSafariViewController and the Expo Go in-app browser
pub const DEFAULT_REDIRECT_STEPS: &[RedirectStep] = &[
    RedirectStep {
        delay_ms: 0,
        strategy: RedirectStrategy::Navigate,
    },
    RedirectStep {
        delay_ms: 500,
        strategy: RedirectStrategy::Replace,
    },
    RedirectStep {
        delay_ms: 1000,
        strategy: RedirectStrategy::OpenSelf,
    },
    RedirectStep {
        delay_ms: 2000,
        strategy: RedirectStrategy::Close,
    },
];

/// Append a query parameter, respecting an existing query string
#[must_use]
pub fn append_query_param(base: &str, key: &str, value: &str) -> String {
    if base.contains('?') {
        format!("{base}&{key}={value}")
    } else {
        format!("{base}?{key}={value}")
    }
}

/// Percent-encode the characters that would break out of the contexts the
/// URL is embedded in (single-quoted JS string, href attribute)
fn sanitize_embedded_url(url: &str) -> String {
    url.replace('\'', "%27")
        .replace('"', "%22")
        .replace('<', "%3C")
        .replace('>', "%3E")
        .replace('\\', "%5C")
}

fn script_for_step(step: &RedirectStep, url: &str) -> String {
    let action = match step.strategy {
        RedirectStrategy::Navigate => format!("window.location.href = '{url}';"),
        RedirectStrategy::Replace => format!("window.location.replace('{url}');"),
        RedirectStrategy::OpenSelf => format!("window.open('{url}', '_self');"),
        RedirectStrategy::Close => "window.close();".to_string(),
    };
    if step.delay_ms == 0 {
        action
    } else {
        format!(
            "setTimeout(function() {{ {action} }}, {delay});",
            delay = step.delay_ms
        )
    }
}

/// Render the self-redirecting page returned by the callback endpoint.
///
/// Always served with status 200: once the handshake has reached the
/// browser shell, a redirect (or a manual link) is the only way to hand
/// control back to the app, success or error alike.
#[must_use]
pub fn render_redirect_page(redirect_url: &str, steps: &[RedirectStep]) -> String {
    let url = sanitize_embedded_url(redirect_url);
    let script = steps
        .iter()
        .map(|step| script_for_step(step, &url))
        .collect::<Vec<_>>()
        .join("\n        ");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Authentication Complete</title>
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <style>
    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      display: flex;
      justify-content: center;
      align-items: center;
      height: 100vh;
      margin: 0;
      background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
      color: white;
    }}
    .container {{
      text-align: center;
      padding: 40px;
      background: rgba(255, 255, 255, 0.1);
      border-radius: 20px;
    }}
    .spinner {{
      border: 3px solid rgba(255, 255, 255, 0.3);
      border-radius: 50%;
      border-top: 3px solid white;
      width: 40px;
      height: 40px;
      animation: spin 1s linear infinite;
      margin: 20px auto;
    }}
    @keyframes spin {{
      0% {{ transform: rotate(0deg); }}
      100% {{ transform: rotate(360deg); }}
    }}
    .manual-link {{
      margin-top: 20px;
      padding: 12px 24px;
      background: white;
      color: #667eea;
      text-decoration: none;
      border-radius: 8px;
      display: inline-block;
      font-weight: 600;
    }}
  </style>
</head>
<body>
  <div class="container">
    <h1>Authentication Complete</h1>
    <p>Returning you to the app...</p>
    <div class="spinner"></div>
    <p style="font-size: 14px; margin-top: 20px;">
      If you are not redirected automatically,<br>
      <a href="{url}" class="manual-link">Open the app</a>
    </p>
  </div>
  <script>
        {script}
  </script>
</body>
</html>
"#
    )
}
