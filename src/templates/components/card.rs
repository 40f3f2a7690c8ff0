use crate::domain::{STATUS_DEPLOYED, STATUS_READY};
use maud::{html, Markup};

pub fn card(title: &str, body: Markup) -> Markup {
    html! {
        section class="card" {
            h2 { (title) }
            div class="card-body" {
                (body)
            }
        }
    }
}

pub fn status_badge(status: Option<&str>) -> Markup {
    let class = match status {
        Some(STATUS_DEPLOYED) => "badge deployed",
        Some(STATUS_READY) => "badge ready",
        _ => "badge",
    };
    html! {
        span class=(class) { (status.unwrap_or("-")) }
    }
}
