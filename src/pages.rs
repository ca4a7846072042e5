//! Server-rendered pages
//!
//! Plain HTML strings, one function per page. Every value that did not come
//! from this file goes through [`html_escape`] before it is interpolated.

use crate::dashboard::{DashboardResponse, PaymentStatus, ProcessedProperty, ProcessedTask};
use crate::store::{Priority, ServiceType, WaitlistEntry};

const PRODUCT: &str = "Gustavo.AI";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; background: #f9fafb; }
header { background: #1e3a8a; color: #fff; padding: 16px 32px; display: flex; justify-content: space-between; align-items: center; }
header a { color: #fff; margin-left: 16px; text-decoration: none; }
main { max-width: 1000px; margin: 32px auto; padding: 0 16px; }
.card { background: #fff; border-radius: 8px; padding: 24px; margin-bottom: 24px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 16px; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 10px; border-bottom: 1px solid #e5e7eb; }
label { display: block; font-weight: 600; margin: 12px 0 4px; }
input, select, textarea { width: 100%; padding: 8px; border: 1px solid #d1d5db; border-radius: 6px; box-sizing: border-box; }
button, .button { background: #2563eb; color: #fff; border: 0; border-radius: 6px; padding: 10px 20px; margin-top: 16px; cursor: pointer; text-decoration: none; display: inline-block; }
.metric { font-size: 1.6em; font-weight: 700; }
.on_time { color: #047857; } .late { color: #b45309; } .overdue { color: #b91c1c; }
#result { margin-top: 12px; font-weight: 600; }
"#;

const WAITLIST_SCRIPT: &str = r#"
document.getElementById('waitlist-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const form = event.target;
  const result = document.getElementById('result');
  const response = await fetch('/api/waitlist', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({
      name: document.getElementById('name').value,
      email: document.getElementById('email').value,
      userType: document.getElementById('userType').value || null,
    }),
  });
  const body = await response.json();
  if (response.ok) {
    result.textContent = "You're on the list! We'll be in touch.";
    form.reset();
  } else {
    result.textContent = body.error ? body.error.message : 'Something went wrong';
  }
});
"#;

const SCHEDULING_SCRIPT: &str = r#"
const lines = (value) => value.split(/[\n,]/).map((s) => s.trim()).filter((s) => s.length > 0);
document.getElementById('scheduling-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const result = document.getElementById('result');
  const response = await fetch('/api/scheduling', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({
      propertyId: document.getElementById('propertyId').value,
      serviceType: document.getElementById('serviceType').value,
      priority: document.getElementById('priority').value,
      description: document.getElementById('description').value,
      participants: lines(document.getElementById('participants').value),
      preferredDates: lines(document.getElementById('preferredDates').value),
      preferredTimeSlots: lines(document.getElementById('preferredTimeSlots').value),
    }),
  });
  const body = await response.json();
  result.textContent = response.ok
    ? 'Request submitted: ' + body.requestId
    : (body.error ? body.error.message : 'Something went wrong');
});
"#;

/// Escape text for HTML element content and quoted attributes
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Whole dollars with thousands separators, e.g. `$1,730,000`
pub fn format_money(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn layout(title: &str, body: &str, script: &str) -> String {
    let title = html_escape(title);
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {product}</title>
<style>{style}</style>
</head>
<body>
<header>
  <strong>{product}</strong>
  <nav>
    <a href="/">Home</a>
    <a href="/scheduling">Scheduling</a>
    <a href="/demo">Demo</a>
    <a href="/waitlist">Join the waitlist</a>
  </nav>
</header>
<main>
{body}
</main>
<script>{script}</script>
</body>
</html>"##,
        product = PRODUCT,
        style = STYLE,
    )
}

/// GET /
pub fn landing_page() -> String {
    let features = [
        (
            "Scheduling Service",
            "Submit a maintenance, cleaning, repair or inspection request in one form.",
        ),
        (
            "AI Communication",
            "Our AI automatically sends emails and SMS messages to coordinate with all participants.",
        ),
        (
            "Calendar Integration",
            "Seamlessly integrates with Google Calendar, Outlook, and Apple Calendar.",
        ),
        (
            "Smart Coordination",
            "AI finds the optimal meeting time by analyzing everyone's availability.",
        ),
    ];
    let steps = [
        ("Submit Request", "Fill out the scheduling form with service details and participants."),
        ("AI Outreach", "Our AI contacts all participants via email and SMS."),
        ("Collect Availability", "AI gathers availability preferences from all participants."),
        ("Schedule Event", "AI finds the best time and creates calendar events for everyone."),
    ];

    let feature_cards: String = features
        .iter()
        .map(|(title, text)| {
            format!(
                r#"<div class="card"><h3>{}</h3><p>{}</p></div>"#,
                html_escape(title),
                html_escape(text)
            )
        })
        .collect();
    let step_items: String = steps
        .iter()
        .map(|(title, text)| {
            format!(
                "<li><strong>{}</strong>: {}</li>",
                html_escape(title),
                html_escape(text)
            )
        })
        .collect();

    let body = format!(
        r##"<section class="card">
  <h1>{product}</h1>
  <p>AI-assisted property management: scheduling, tenant communication and portfolio tracking for landlords.</p>
  <a class="button" href="/waitlist">Join the waitlist</a>
  <a class="button" href="/demo">See the demo</a>
</section>
<section class="grid">{feature_cards}</section>
<section class="card">
  <h2>How It Works</h2>
  <ol>{step_items}</ol>
</section>"##,
        product = PRODUCT,
    );

    layout("Property management on autopilot", &body, "")
}

/// GET /waitlist
pub fn waitlist_page() -> String {
    let body = r##"<section class="card">
  <h1>Join the waitlist</h1>
  <p>Be the first to know when Gustavo opens up in your area.</p>
  <form id="waitlist-form">
    <label for="name">Name</label>
    <input id="name" name="name" required>
    <label for="email">Email</label>
    <input id="email" name="email" type="email" required>
    <label for="userType">I am a</label>
    <select id="userType" name="userType">
      <option value="">Prefer not to say</option>
      <option value="landlord">Landlord</option>
      <option value="property_manager">Property manager</option>
      <option value="tenant">Tenant</option>
    </select>
    <button type="submit">Join</button>
    <div id="result"></div>
  </form>
</section>"##;

    layout("Join the waitlist", body, WAITLIST_SCRIPT)
}

/// GET /admin/waitlist
pub fn admin_waitlist_page(entries: &[WaitlistEntry]) -> String {
    let rows: String = if entries.is_empty() {
        r#"<tr><td colspan="4">No signups yet.</td></tr>"#.to_string()
    } else {
        entries.iter().map(render_waitlist_row).collect()
    };
    let count = entries.len();

    let body = format!(
        r##"<section class="card">
  <h1>Waitlist ({count})</h1>
  <a class="button" href="/api/waitlist/export">Export CSV</a>
  <table>
    <thead><tr><th>Name</th><th>Email</th><th>Type</th><th>Date</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
</section>"##
    );

    layout("Waitlist admin", &body, "")
}

fn render_waitlist_row(entry: &WaitlistEntry) -> String {
    let name = html_escape(&entry.name);
    let email = html_escape(&entry.email);
    let user_type = entry
        .user_type
        .as_deref()
        .map(html_escape)
        .unwrap_or_else(|| "-".to_string());
    let date = entry.created_at.format("%Y-%m-%d %H:%M").to_string();

    format!("<tr><td>{name}</td><td>{email}</td><td>{user_type}</td><td>{date}</td></tr>")
}

/// GET /scheduling
pub fn scheduling_page() -> String {
    let service_options: String = ServiceType::ALL
        .iter()
        .map(|s| format!(r#"<option value="{0}">{0}</option>"#, s.as_str()))
        .collect();
    let priority_options: String = Priority::ALL
        .iter()
        .map(|p| {
            let selected = if *p == Priority::default() { " selected" } else { "" };
            format!(r#"<option value="{0}"{selected}>{0}</option>"#, p.as_str())
        })
        .collect();

    let body = format!(
        r##"<section class="card">
  <h1>Schedule a service</h1>
  <p>Tell us what needs doing and who should be there. We'll coordinate the rest.</p>
  <form id="scheduling-form">
    <label for="propertyId">Property ID</label>
    <input id="propertyId" name="propertyId" required>
    <label for="serviceType">Service type</label>
    <select id="serviceType" name="serviceType">{service_options}</select>
    <label for="priority">Priority</label>
    <select id="priority" name="priority">{priority_options}</select>
    <label for="description">Description</label>
    <textarea id="description" name="description" rows="3"></textarea>
    <label for="participants">Participants (emails or phone numbers, one per line)</label>
    <textarea id="participants" name="participants" rows="3" required></textarea>
    <label for="preferredDates">Preferred dates (YYYY-MM-DD, one per line)</label>
    <textarea id="preferredDates" name="preferredDates" rows="2"></textarea>
    <label for="preferredTimeSlots">Preferred time slots (e.g. 09:00-11:00)</label>
    <textarea id="preferredTimeSlots" name="preferredTimeSlots" rows="2"></textarea>
    <button type="submit">Submit request</button>
    <div id="result"></div>
  </form>
</section>"##
    );

    layout("Schedule a service", &body, SCHEDULING_SCRIPT)
}

/// GET /demo
pub fn demo_page(dashboard: &DashboardResponse) -> String {
    let metrics = &dashboard.metrics;
    let total_value = format_money(metrics.total_value);
    let collected = format_money(metrics.monthly_rent_collected);
    let to_collect = format_money(metrics.monthly_rent_to_collect);
    let occupancy = format!("{:.1}%", metrics.occupancy_rate);
    let late = metrics.late_payments;
    let overdue = metrics.overdue_payments;

    let property_rows: String = dashboard.properties.iter().map(render_property_row).collect();
    let task_items: String = dashboard.tasks.iter().map(render_task_item).collect();

    let body = format!(
        r##"<section class="card">
  <h1>Portfolio dashboard</h1>
  <p>A sample landlord portfolio, aggregated exactly like a live account.</p>
</section>
<section class="grid">
  <div class="card"><div>Total value</div><div class="metric">{total_value}</div></div>
  <div class="card"><div>Rent collected</div><div class="metric">{collected}</div></div>
  <div class="card"><div>Rent to collect</div><div class="metric">{to_collect}</div></div>
  <div class="card"><div>Occupancy</div><div class="metric">{occupancy}</div></div>
  <div class="card"><div>Late / overdue</div><div class="metric">{late} / {overdue}</div></div>
</section>
<section class="card">
  <h2>Properties</h2>
  <table>
    <thead><tr><th>Address</th><th>Value</th><th>Rent</th><th>Occupied</th><th>Last payment</th><th>Status</th></tr></thead>
    <tbody>{property_rows}</tbody>
  </table>
</section>
<section class="card">
  <h2>Tasks</h2>
  <ul>{task_items}</ul>
</section>"##
    );

    layout("Demo dashboard", &body, "")
}

fn render_property_row(property: &ProcessedProperty) -> String {
    let address = html_escape(&property.address);
    let value = match property.zillow_value {
        Some(v) => format!("{} (Zillow)", format_money(v)),
        None => format_money(property.value),
    };
    let rent = format_money(property.monthly_rent);
    let occupied = if property.is_occupied { "Yes" } else { "Vacant" };
    let last_payment = property
        .last_payment_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = property.payment_status.as_str();
    let label = match property.payment_status {
        PaymentStatus::OnTime => "On time",
        PaymentStatus::Late => "Late",
        PaymentStatus::Overdue => "Overdue",
    };

    format!(
        r#"<tr><td>{address}</td><td>{value}</td><td>{rent}</td><td>{occupied}</td><td>{last_payment}</td><td class="{status}">{label}</td></tr>"#
    )
}

fn render_task_item(task: &ProcessedTask) -> String {
    let title = html_escape(&task.title);
    let description = html_escape(&task.description);
    let kind = html_escape(&task.task_type.replace('_', " "));
    let priority = html_escape(&task.priority);
    let when = match (task.completed_date, task.due_date) {
        (Some(done), _) => format!("completed {}", done.format("%Y-%m-%d")),
        (None, Some(due)) => format!("due {}", due.format("%Y-%m-%d")),
        (None, None) => String::new(),
    };

    format!(
        "<li><strong>{title}</strong> <em>({kind}, {priority})</em> {when}<br>{description}</li>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::demo_dashboard;
    use crate::store::NewWaitlistEntry;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(999.0), "$999");
        assert_eq!(format_money(2_800.0), "$2,800");
        assert_eq!(format_money(1_730_000.0), "$1,730,000");
        assert_eq!(format_money(-1_500.4), "-$1,500");
    }

    #[test]
    fn test_admin_page_escapes_entries() {
        let entry = NewWaitlistEntry {
            name: "<b>Mallory</b>".to_string(),
            email: "m@example.com".to_string(),
            user_type: Some("landlord".to_string()),
        }
        .into_entry();

        let html = admin_waitlist_page(&[entry]);
        assert!(html.contains("&lt;b&gt;Mallory&lt;/b&gt;"));
        assert!(!html.contains("<b>Mallory"));
        assert!(html.contains("Waitlist (1)"));
        assert!(html.contains("/api/waitlist/export"));
    }

    #[test]
    fn test_demo_page_shows_metrics() {
        let html = demo_page(&demo_dashboard());
        assert!(html.contains("$1,730,000"));
        assert!(html.contains("75.0%"));
        assert!(html.contains("123 Main St"));
        assert!(html.contains(r#"class="overdue""#));
    }

    #[test]
    fn test_static_pages_render() {
        assert!(landing_page().contains("How It Works"));
        assert!(waitlist_page().contains("/api/waitlist"));

        let scheduling = scheduling_page();
        assert!(scheduling.contains(r#"<option value="inspection">"#));
        assert!(scheduling.contains(r#"<option value="medium" selected>"#));
    }
}
