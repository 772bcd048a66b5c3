//! Server-rendered pages.

use irec_auth::Profile;
use irec_auth::http::templates::{html_escape, html_page};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::api::{Position, Recommendation};

fn header(profile: Option<&Profile>) -> String {
    let mut html = String::from("<header>\n<a href=\"/positions\"><strong>irec</strong></a>\n");
    if let Some(profile) = profile {
        html.push_str("<a class=\"user\" href=\"/user\">");
        if let Some(picture) = profile.picture.as_deref().filter(|p| !p.is_empty()) {
            html.push_str("<img src=\"");
            html.push_str(&html_escape(picture));
            html.push_str("\" alt=\"\">");
        }
        html.push_str("<span>");
        html.push_str(&html_escape(profile.display_name()));
        html.push_str("</span></a>\n");
    }
    html.push_str("</header>\n");
    html
}

fn date(value: Option<OffsetDateTime>) -> String {
    // The backend sends the zero time for unset dates.
    match value {
        Some(dt) if dt.year() > 1 => dt
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn input(label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        "<div class=\"form-group\"><label class=\"form-label\" for=\"{name}\">{label}</label>\
         <input class=\"form-input\" type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{value}\"></div>\n",
        value = html_escape(value),
    )
}

/// Landing page with the sign-in button.
#[must_use]
pub fn start_page(login_href: &str) -> String {
    let mut content = header(None);
    content.push_str("<main>\n<div class=\"card\">\n<h2>Recommend the people you trust</h2>\n");
    content.push_str("<p class=\"muted\">Sign in to see open positions and recommend candidates.</p>\n");
    content.push_str("<p style=\"margin-top: 1rem;\"><a class=\"btn btn-primary\" href=\"");
    content.push_str(&html_escape(login_href));
    content.push_str("\">Sign in</a></p>\n</div>\n</main>");
    html_page("Welcome", &content)
}

/// Shown when a protected page is requested without a session.
#[must_use]
pub fn unauth_page(login_href: &str) -> String {
    let mut content = header(None);
    content.push_str("<main>\n<div class=\"card\">\n<h2>You are not signed in</h2>\n");
    content.push_str("<p class=\"muted\">Sign in to continue.</p>\n");
    content.push_str("<p style=\"margin-top: 1rem;\"><a class=\"btn btn-primary\" href=\"");
    content.push_str(&html_escape(login_href));
    content.push_str("\">Sign in</a></p>\n</div>\n</main>");
    html_page("Not signed in", &content)
}

/// Profile of the signed-in user.
#[must_use]
pub fn user_page(profile: &Profile) -> String {
    let mut content = header(Some(profile));
    content.push_str("<main>\n<div class=\"card\">\n<h2>");
    content.push_str(&html_escape(profile.display_name()));
    content.push_str("</h2>\n");
    for value in [&profile.headline, &profile.email].into_iter().flatten() {
        content.push_str("<p class=\"muted\">");
        content.push_str(&html_escape(value));
        content.push_str("</p>\n");
    }
    if let Some(url) = &profile.profile_url {
        content.push_str("<p><a href=\"");
        content.push_str(&html_escape(url));
        content.push_str("\">Public profile</a></p>\n");
    }
    content.push_str("</div>\n</main>");
    html_page("Profile", &content)
}

/// Registration form for a user the backend does not know yet.
#[must_use]
pub fn registration_page(profile: &Profile) -> String {
    let mut content = header(Some(profile));
    content.push_str("<main>\n<div class=\"card\">\n<h2>Complete your registration</h2>\n");
    content.push_str("<form method=\"post\" action=\"/user/single/");
    content.push_str(&html_escape(&profile.user_id));
    content.push_str("\">\n");
    content.push_str(&input("Name", "Name", "text", profile.name.as_deref().unwrap_or("")));
    content.push_str(&input("Telephone", "Telephone", "tel", ""));
    content.push_str(&input("Email", "Mail", "email", profile.email.as_deref().unwrap_or("")));
    content.push_str(&input(
        "Headline",
        "Headline",
        "text",
        profile.headline.as_deref().unwrap_or(""),
    ));
    content.push_str(&input(
        "Profile URL",
        "ProfileURL",
        "url",
        profile.profile_url.as_deref().unwrap_or(""),
    ));
    content.push_str("<button class=\"btn btn-primary\" type=\"submit\">Register</button>\n</form>\n");
    content.push_str("</div>\n</main>");
    html_page("Register", &content)
}

/// All open positions.
#[must_use]
pub fn positions_page(profile: &Profile, positions: &[Position]) -> String {
    let mut content = header(Some(profile));
    content.push_str("<main>\n");
    if positions.is_empty() {
        content.push_str("<div class=\"card\"><p class=\"muted\">No open positions.</p></div>\n");
    }
    for position in positions {
        content.push_str("<div class=\"card\">\n<h2><a href=\"/positions/single/");
        content.push_str(&position.idpositions.to_string());
        content.push_str("\">");
        content.push_str(&html_escape(&position.title));
        content.push_str("</a></h2>\n<p class=\"muted\">");
        content.push_str(&html_escape(&position.subtitle));
        content.push_str("</p>\n");
        let enddate = date(position.enddate);
        if !enddate.is_empty() {
            content.push_str("<p class=\"muted\">Open until ");
            content.push_str(&enddate);
            content.push_str("</p>\n");
        }
        content.push_str("</div>\n");
    }
    content.push_str("</main>");
    html_page("Positions", &content)
}

/// One position with the recommendation form.
#[must_use]
pub fn position_page(profile: &Profile, position: &Position) -> String {
    let id = position.idpositions.to_string();
    let mut content = header(Some(profile));
    content.push_str("<main>\n<div class=\"card\">\n<h2>");
    content.push_str(&html_escape(&position.title));
    content.push_str("</h2>\n<p class=\"muted\">");
    content.push_str(&html_escape(&position.subtitle));
    content.push_str("</p>\n<p style=\"margin-top: 1rem;\">");
    content.push_str(&html_escape(&position.text));
    content.push_str("</p>\n");
    if !position.reward.is_empty() {
        content.push_str("<p class=\"muted\">Reward: ");
        content.push_str(&html_escape(&position.reward));
        content.push_str("</p>\n");
    }
    content.push_str("<p><a href=\"/recommendations/positions/");
    content.push_str(&id);
    content.push_str("\">Recommendations</a></p>\n</div>\n");

    content.push_str("<div class=\"card\">\n<h2>Recommend someone</h2>\n");
    content.push_str("<form method=\"post\" action=\"/recommendation/");
    content.push_str(&id);
    content.push_str("\">\n");
    content.push_str(&input("Name", "Name", "text", ""));
    content.push_str(&input("Telephone", "Telephone", "tel", ""));
    content.push_str(&input("Email", "Mail", "email", ""));
    content.push_str("<button class=\"btn btn-primary\" type=\"submit\">Recommend</button>\n</form>\n");
    content.push_str("</div>\n</main>");
    html_page(&position.title, &content)
}

/// Recommendations made for one position.
#[must_use]
pub fn recommendations_page(profile: &Profile, recommendations: &[Recommendation]) -> String {
    let mut content = header(Some(profile));
    content.push_str("<main>\n");
    if recommendations.is_empty() {
        content.push_str("<div class=\"card\"><p class=\"muted\">No recommendations yet.</p></div>\n");
    }
    for rec in recommendations {
        let referral = rec.referral.as_ref();
        content.push_str("<div class=\"card\">\n<h2>");
        content.push_str(&html_escape(referral.map_or("", |r| r.name.as_str())));
        content.push_str("</h2>\n<p class=\"muted\">");
        content.push_str(&html_escape(referral.map_or("", |r| r.mail.as_str())));
        content.push_str("</p>\n");
        if let Some(user) = &rec.user {
            content.push_str("<p class=\"muted\">Recommended by ");
            content.push_str(&html_escape(&user.name));
            content.push_str("</p>\n");
        }
        if rec.confirmed {
            content.push_str("<p><strong>Confirmed</strong></p>\n");
        }
        content.push_str("</div>\n");
    }
    content.push_str("</main>");
    html_page("Recommendations", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Referral;

    fn profile() -> Profile {
        Profile::new("u1")
            .with_name("Ada <Admin>")
            .with_picture("https://img.example.com/u1.png")
    }

    #[test]
    fn test_header_escapes_profile() {
        let html = user_page(&profile());
        assert!(html.contains("Ada &lt;Admin&gt;"));
        assert!(!html.contains("<Admin>"));
        assert!(html.contains("https://img.example.com/u1.png"));
    }

    #[test]
    fn test_positions_page_links_each_position() {
        let position = Position {
            title: "Engineer".into(),
            ..Position::default()
        };
        let html = positions_page(&profile(), &[position.clone()]);
        assert!(html.contains(&format!("/positions/single/{}", position.idpositions)));
        assert!(html.contains("Engineer"));
    }

    #[test]
    fn test_zero_dates_are_hidden() {
        assert_eq!(date(Some(OffsetDateTime::UNIX_EPOCH)), "1970-01-01");
        let zero = time::Date::from_calendar_date(1, time::Month::January, 1)
            .unwrap()
            .midnight()
            .assume_utc();
        assert_eq!(date(Some(zero)), "");
        assert_eq!(date(None), "");
    }

    #[test]
    fn test_registration_form_prefilled() {
        let html = registration_page(&profile());
        assert!(html.contains("action=\"/user/single/u1\""));
        assert!(html.contains("value=\"Ada &lt;Admin&gt;\""));
        assert!(html.contains("name=\"ProfileURL\""));
    }

    #[test]
    fn test_recommendations_page() {
        let rec = Recommendation {
            referral: Some(Referral {
                name: "Bob".into(),
                ..Referral::default()
            }),
            confirmed: true,
            ..Recommendation::default()
        };
        let html = recommendations_page(&profile(), &[rec]);
        assert!(html.contains("Bob"));
        assert!(html.contains("Confirmed"));
    }
}
