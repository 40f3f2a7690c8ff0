use crate::domain::history::Change;
use crate::domain::{DomainField, HistoryEvent, InventoryItem, STATUS_DEPLOYED};
use crate::templates::{card, desktop_layout, status_badge};
use maud::{html, Markup};

pub struct ItemVm<'a> {
    pub user: &'a str,
    pub item: &'a InventoryItem,
    pub history: &'a [HistoryEvent],
}

fn change_cells(change: &Change) -> Markup {
    match change {
        Change::Added { to } => html! { td { "added" } td {} td { (to) } },
        Change::Changed { from, to } => html! { td { "changed" } td { (from) } td { (to) } },
        Change::Removed { from } => html! { td { "removed" } td { (from) } td {} },
    }
}

pub fn item_page(vm: &ItemVm<'_>) -> Markup {
    let item = vm.item;
    let title = item.asset.as_deref().unwrap_or("Item");
    let deployed = item.status.as_deref() == Some(STATUS_DEPLOYED);

    desktop_layout(
        title,
        vm.user,
        html! {
            main class="container" {
                h1 { (title) " " (status_badge(item.status.as_deref())) }

                (card("Details", html! {
                    table {
                        @for field in DomainField::ALL {
                            @if field != DomainField::Status {
                                tr {
                                    th { (field.label()) }
                                    td { (item.get(field).unwrap_or("")) }
                                }
                            }
                        }
                        tr {
                            th { "Last modified" }
                            td {
                                (item.modified.as_deref().unwrap_or(""))
                                @if let Some(by) = &item.modified_by { " by " (by) }
                            }
                        }
                    }
                }))

                (card(if deployed { "Check in" } else { "Check out" }, html! {
                    @if deployed {
                        form method="post" action={ "/items/" (item.id) "/checkin" } {
                            button type="submit" { "Return to stock" }
                        }
                    } @else {
                        form method="post" action={ "/items/" (item.id) "/checkout" } {
                            input type="text" name="to" placeholder="Recipient or location" required;
                            " "
                            button type="submit" { "Check out" }
                        }
                    }
                }))

                (card("History", html! {
                    @if vm.history.is_empty() {
                        p class="muted" { "No changes recorded." }
                    } @else {
                        table {
                            thead {
                                tr {
                                    th { "When" }
                                    th { "Who" }
                                    th { "Field" }
                                    th { "Change" }
                                    th { "From" }
                                    th { "To" }
                                }
                            }
                            tbody {
                                @for event in vm.history.iter().rev() {
                                    tr {
                                        td { (event.timestamp) }
                                        td { (event.actor.as_deref().unwrap_or("")) }
                                        td { (event.field.label()) }
                                        (change_cells(&event.change))
                                    }
                                }
                            }
                        }
                    }
                }))
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployed_items_offer_check_in() {
        let item = InventoryItem {
            id: "9".into(),
            asset: Some("LAP-9".into()),
            status: Some(STATUS_DEPLOYED.into()),
            user_location: Some("Bob".into()),
            ..Default::default()
        };
        let history = vec![HistoryEvent {
            timestamp: "2024-03-01T10:00:00Z".into(),
            actor: Some("Ana".into()),
            field: DomainField::UserLocation,
            change: Change::Added { to: "Bob".into() },
        }];
        let page = item_page(&ItemVm {
            user: "Ana",
            item: &item,
            history: &history,
        })
        .into_string();

        assert!(page.contains("/items/9/checkin"));
        assert!(!page.contains("/items/9/checkout"));
        assert!(page.contains("User / Location"));
        assert!(page.contains("added"));
    }
}
