//! The single dashboard page.

use chrono::Local;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use serde::Serialize;

use crate::alarm::AlarmEvent;
use crate::notify::NotificationRecord;

/// An alarm as the page and `/api/alarms` show it.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmView {
    pub id: u64,
    pub title: String,
    /// Local fire time, `mm/dd/yy HH:MM`.
    pub content: String,
    pub priority: i32,
}

impl From<&AlarmEvent> for AlarmView {
    fn from(ev: &AlarmEvent) -> Self {
        Self {
            id: ev.id.0,
            title: ev.payload.label.clone(),
            content: ev
                .fire_at
                .with_timezone(&Local)
                .format("%m/%d/%y %H:%M")
                .to_string(),
            priority: ev.priority,
        }
    }
}

pub struct Page<'a> {
    pub now: &'a str,
    pub alarms: &'a [AlarmView],
    pub notifications: &'a [NotificationRecord],
    pub banner: Option<&'a str>,
}

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="60; url=/index">
<title>Daily Briefing</title>
<style>
body { font-family: sans-serif; margin: 0; display: grid; grid-template-columns: 1fr 2fr 1fr; gap: 1rem; }
section { padding: 1rem; }
.card { border: 1px solid #ccc; border-radius: 6px; padding: .5rem; margin-bottom: .5rem; }
.card h3 { margin: 0 0 .25rem 0; font-size: 1rem; }
.card pre { white-space: pre-wrap; margin: 0; font-family: inherit; }
.banner { grid-column: 1 / 4; background: #fee; padding: .5rem 1rem; }
</style>
</head>
<body>
"#;

fn dismiss_form(name: &str, value: &str) -> String {
    format!(
        "<form action=\"/index\" method=\"get\"><input type=\"hidden\" name=\"{name}\" value=\"{}\"><button type=\"submit\">&times;</button></form>",
        attr(value)
    )
}

pub fn render_index(page: &Page<'_>) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(HEAD);

    if let Some(msg) = page.banner {
        out.push_str(&format!("<div class=\"banner\">{}</div>\n", text(msg)));
    }

    out.push_str("<section id=\"alarms\">\n<h2>Alarms</h2>\n");
    if page.alarms.is_empty() {
        out.push_str("<p>No alarms set.</p>\n");
    }
    for a in page.alarms {
        out.push_str(&format!(
            "<div class=\"card\"><h3>{}</h3><p>{}</p>{}</div>\n",
            text(&a.title),
            text(&a.content),
            dismiss_form("cancel", &a.id.to_string())
        ));
    }
    out.push_str("</section>\n");

    out.push_str(&format!(
        r#"<section id="schedule">
<h2>Smart Alarm</h2>
<p>{}</p>
<form action="/index" method="get">
<label>Time <input type="time" name="alarm" required></label><br>
<label>Label <input type="text" name="two" placeholder="Alarm label"></label><br>
<label><input type="checkbox" name="weather" value="1"> Weather briefing</label><br>
<label><input type="checkbox" name="news" value="1"> News briefing</label><br>
<button type="submit">Set alarm</button>
</form>
</section>
"#,
        text(page.now)
    ));

    out.push_str("<section id=\"notifications\">\n<h2>Notifications</h2>\n");
    for n in page.notifications {
        // content is built by the notification builder with escaping applied
        out.push_str(&format!(
            "<div class=\"card\"><h3>{}</h3><pre>{}</pre>{}</div>\n",
            text(&n.title),
            n.content,
            dismiss_form("notif", &n.title)
        ));
    }
    out.push_str("</section>\n</body>\n</html>\n");
    out
}
