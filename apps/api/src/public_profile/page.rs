//! Server-rendered HTML for `/u/{slug}`.
//!
//! Unlike the JSON endpoint, the page honors the `show*` flags and only
//! renders the sections the owner chose to publish.

use std::fmt::Write;

use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::extract::is_web_url;
use crate::public_profile::models::{PublicProfileDetails, PublicProfileView, PublicSkill};

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:48rem;margin:0 auto;padding:2rem;color:#1f2937}\
header{display:flex;gap:1.5rem;align-items:center}\
header img{width:6rem;height:6rem;border-radius:50%;object-fit:cover}\
section{margin-top:2rem}\
.tag{display:inline-block;background:#eef2ff;border-radius:.25rem;padding:0 .4rem;margin-right:.25rem;font-size:.85rem}\
.muted{color:#6b7280}";

pub fn robots_directive(seo_indexable: bool) -> &'static str {
    if seo_indexable {
        "index, follow"
    } else {
        "noindex, nofollow"
    }
}

pub fn render_profile_page(view: &PublicProfileView) -> String {
    let settings = &view.settings;
    let user = &view.user;
    let profile = user.profile.as_ref();

    let title = format!(
        "{} - {}",
        user.full_name,
        profile
            .and_then(|p| p.title.as_deref())
            .unwrap_or("Portfolio")
    );
    let description = profile
        .and_then(|p| p.bio.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("View {}'s professional portfolio", user.full_name));

    let mut body = String::new();

    if settings.show_profile {
        render_header(&mut body, &user.full_name, profile);
        if let Some(bio) = profile.and_then(|p| p.bio.as_deref()) {
            let _ = write!(body, "<section><h2>About</h2><p>{}</p></section>", text(bio));
        }
    } else {
        let _ = write!(body, "<header><h1>{}</h1></header>", text(&user.full_name));
    }

    if settings.show_skills && !user.skills.is_empty() {
        render_skills(&mut body, &user.skills);
    }

    if settings.show_experience && !user.experiences.is_empty() {
        body.push_str("<section><h2>Experience</h2>");
        for exp in &user.experiences {
            let _ = write!(
                body,
                "<article><h3>{} <span class=\"muted\">at {}</span></h3><p class=\"muted\">{}",
                text(&exp.role),
                text(&exp.company),
                date_range(exp.start_date, exp.end_date)
            );
            if let Some(location) = &exp.location {
                let _ = write!(body, " · {}", text(location));
            }
            body.push_str("</p>");
            if !exp.bullets.is_empty() {
                body.push_str("<ul>");
                for bullet in &exp.bullets {
                    let _ = write!(body, "<li>{}</li>", text(bullet));
                }
                body.push_str("</ul>");
            }
            body.push_str("</article>");
        }
        body.push_str("</section>");
    }

    if settings.show_projects && !user.portfolio_items.is_empty() {
        body.push_str("<section><h2>Projects</h2>");
        for item in &user.portfolio_items {
            body.push_str("<article>");
            if let Some(image) = web_link(item.image_url.as_deref()) {
                let _ = write!(
                    body,
                    "<img src=\"{}\" alt=\"{}\" width=\"320\">",
                    attr(image),
                    attr(&item.title)
                );
            }
            match web_link(item.url.as_deref()) {
                Some(url) => {
                    let _ = write!(
                        body,
                        "<h3><a href=\"{}\" rel=\"noopener\">{}</a></h3>",
                        attr(url),
                        text(&item.title)
                    );
                }
                None => {
                    let _ = write!(body, "<h3>{}</h3>", text(&item.title));
                }
            }
            if let Some(description) = &item.description {
                let _ = write!(body, "<p>{}</p>", text(description));
            }
            for tag in &item.tags {
                let _ = write!(body, "<span class=\"tag\">{}</span>", text(tag));
            }
            body.push_str("</article>");
        }
        body.push_str("</section>");
    }

    if settings.allow_cv_request {
        if let Some(cv) = &view.selected_cv {
            let _ = write!(
                body,
                "<section><h2>Resume</h2><p><a href=\"/api/public-profile/{}/cv\">Download {}</a></p></section>",
                attr(&settings.slug),
                text(&cv.name)
            );
        }
    }

    if settings.show_contact {
        let blurb = if settings.allow_cv_request {
            "Interested in working together? Reach out through the links above or download my resume."
        } else {
            "Interested in working together? Reach out through the links above."
        };
        let _ = write!(body, "<section><h2>Contact</h2><p>{blurb}</p></section>");
    }

    document(&title, &description, settings.seo_indexable, &body)
}

pub fn render_not_found_page() -> String {
    document(
        "Profile not found",
        "This profile does not exist or is not public.",
        false,
        "<h1>Profile not found</h1><p class=\"muted\">This profile does not exist or is not public.</p>",
    )
}

fn document(title: &str, description: &str, seo_indexable: bool, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{}</title><meta name=\"description\" content=\"{}\">\
<meta name=\"robots\" content=\"{}\"><style>{STYLE}</style></head>\
<body><main>{body}</main></body></html>",
        text(title),
        attr(description),
        robots_directive(seo_indexable),
    )
}

fn render_header(out: &mut String, full_name: &str, profile: Option<&PublicProfileDetails>) {
    out.push_str("<header>");
    if let Some(avatar) = web_link(profile.and_then(|p| p.avatar_url.as_deref())) {
        let _ = write!(out, "<img src=\"{}\" alt=\"{}\">", attr(avatar), attr(full_name));
    }
    let _ = write!(out, "<div><h1>{}</h1>", text(full_name));
    if let Some(profile) = profile {
        if let Some(title) = &profile.title {
            let _ = write!(out, "<p>{}</p>", text(title));
        }
        if let Some(location) = &profile.location {
            let _ = write!(out, "<p class=\"muted\">{}</p>", text(location));
        }
        let links = social_links(profile);
        if !links.is_empty() {
            out.push_str("<nav>");
            for (label, href) in links {
                let _ = write!(
                    out,
                    "<a href=\"{}\" rel=\"noopener\">{}</a> ",
                    attr(href),
                    text(label)
                );
            }
            out.push_str("</nav>");
        }
    }
    out.push_str("</div></header>");
}

fn social_links(profile: &PublicProfileDetails) -> Vec<(&str, &str)> {
    let mut links = Vec::new();
    if let Some(url) = web_link(profile.website.as_deref()) {
        links.push(("Website", url));
    }
    if let Some(url) = web_link(profile.github.as_deref()) {
        links.push(("GitHub", url));
    }
    if let Some(url) = web_link(profile.linkedin.as_deref()) {
        links.push(("LinkedIn", url));
    }
    if let Some(url) = web_link(profile.other_link.as_deref()) {
        let label = profile.other_link_label.as_deref().unwrap_or("Other");
        links.push((label, url));
    }
    links
}

/// Rows written before link validation existed may hold other schemes.
fn web_link(value: Option<&str>) -> Option<&str> {
    value.filter(|v| is_web_url(v))
}

/// Skills arrive sorted by category order, so grouping keeps runs together.
fn render_skills(out: &mut String, skills: &[PublicSkill]) {
    out.push_str("<section><h2>Skills</h2>");
    let mut current: Option<&str> = None;
    for skill in skills {
        if current != Some(skill.category_name.as_str()) {
            if current.is_some() {
                out.push_str("</ul>");
            }
            let _ = write!(out, "<h3>{}</h3><ul>", text(&skill.category_name));
            current = Some(skill.category_name.as_str());
        }
        let _ = write!(
            out,
            "<li>{} <span class=\"muted\">{}/5</span></li>",
            text(&skill.name),
            skill.level
        );
    }
    if current.is_some() {
        out.push_str("</ul>");
    }
    out.push_str("</section>");
}

fn date_range(start: NaiveDate, end: Option<NaiveDate>) -> String {
    let end = end
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| "Present".to_string());
    format!("{} - {}", start.format("%b %Y"), end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::public_profile::models::{
        PublicDocument, PublicExperience, PublicPortfolioItem, PublicSettings, PublicUser,
    };

    fn view() -> PublicProfileView {
        let user_id = Uuid::new_v4();
        let cv_id = Uuid::new_v4();
        PublicProfileView {
            settings: PublicSettings {
                id: Uuid::new_v4(),
                user_id,
                slug: "janedoe".to_string(),
                enabled: true,
                seo_indexable: false,
                show_profile: true,
                show_skills: true,
                show_experience: true,
                show_projects: true,
                show_contact: false,
                allow_cv_request: false,
                selected_project_ids: vec![],
                selected_experience_ids: vec![],
                selected_cv_id: Some(cv_id),
            },
            selected_cv: Some(PublicDocument {
                id: cv_id,
                name: "Jane CV".to_string(),
                file_url: "documents/x.pdf".to_string(),
                file_type: "pdf".to_string(),
                created_at: Utc::now(),
            }),
            user: PublicUser {
                id: user_id,
                full_name: "Jane <Doe>".to_string(),
                profile: Some(PublicProfileDetails {
                    title: Some("Engineer".to_string()),
                    bio: Some("Builds things".to_string()),
                    location: None,
                    phone: Some("555-0100".to_string()),
                    avatar_url: None,
                    website: None,
                    github: Some("https://github.com/jane".to_string()),
                    linkedin: None,
                    other_link: Some("https://jane.blog".to_string()),
                    other_link_label: None,
                }),
                skills: vec![PublicSkill {
                    id: Uuid::new_v4(),
                    name: "Rust".to_string(),
                    level: 5,
                    category_name: "Backend".to_string(),
                    project_count: 2,
                }],
                experiences: vec![PublicExperience {
                    id: Uuid::new_v4(),
                    company: "Acme".to_string(),
                    role: "Staff Engineer".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
                    end_date: None,
                    location: None,
                    bullets: vec!["Led the platform team".to_string()],
                }],
                documents: vec![],
                portfolio_items: vec![PublicPortfolioItem {
                    id: Uuid::new_v4(),
                    title: "Widget".to_string(),
                    description: None,
                    url: None,
                    tags: vec!["rust".to_string()],
                    image_url: None,
                }],
            },
        }
    }

    #[test]
    fn test_robots_directive() {
        assert_eq!(robots_directive(true), "index, follow");
        assert_eq!(robots_directive(false), "noindex, nofollow");
    }

    #[test]
    fn test_page_escapes_user_content() {
        let html = render_profile_page(&view());
        assert!(html.contains("Jane &lt;Doe&gt;"));
        assert!(!html.contains("<Doe>"));
        assert!(html.contains("<title>Jane &lt;Doe&gt; - Engineer</title>"));
    }

    #[test]
    fn test_page_renders_enabled_sections() {
        let html = render_profile_page(&view());
        assert!(html.contains("<meta name=\"robots\" content=\"noindex, nofollow\">"));
        assert!(html.contains("<h2>About</h2>"));
        assert!(html.contains("<h3>Backend</h3>"));
        assert!(html.contains("Mar 2021 - Present"));
        assert!(html.contains("Widget"));
        assert!(html.contains(">Other</a>"));
        assert!(!html.contains("555-0100"));
    }

    #[test]
    fn test_page_hides_disabled_sections() {
        let mut v = view();
        v.settings.show_skills = false;
        v.settings.show_experience = false;
        v.settings.show_projects = false;
        v.settings.seo_indexable = true;
        let html = render_profile_page(&v);
        assert!(!html.contains("<h2>Skills</h2>"));
        assert!(!html.contains("<h2>Experience</h2>"));
        assert!(!html.contains("<h2>Projects</h2>"));
        assert!(html.contains("content=\"index, follow\""));
    }

    #[test]
    fn test_resume_section_requires_permission() {
        let mut v = view();
        assert!(!render_profile_page(&v).contains("/api/public-profile/janedoe/cv"));
        v.settings.allow_cv_request = true;
        assert!(render_profile_page(&v).contains("/api/public-profile/janedoe/cv"));
    }

    #[test]
    fn test_not_found_page_is_noindex() {
        let html = render_not_found_page();
        assert!(html.contains("Profile not found"));
        assert!(html.contains("noindex, nofollow"));
    }

    #[test]
    fn test_page_drops_script_and_data_links() {
        let mut v = view();
        if let Some(profile) = v.user.profile.as_mut() {
            profile.avatar_url = Some("data:image/svg+xml;base64,PHN2Zz4=".to_string());
            profile.website = Some("javascript:alert(document.cookie)".to_string());
        }
        v.user.portfolio_items[0].url = Some("javascript:alert(document.cookie)".to_string());
        v.user.portfolio_items[0].image_url = Some("data:text/html,<script>".to_string());

        let html = render_profile_page(&v);
        assert!(!html.to_lowercase().contains("javascript:"));
        assert!(!html.contains("data:"));
        assert!(html.contains("<h3>Widget</h3>"));
        assert!(html.contains("href=\"https://github.com/jane\""));
    }
}
