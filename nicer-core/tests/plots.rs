mod common;

use common::*;
use nicer_core::{Delivery, PageEvent, PlotError, Session, Typesetter};
use page::document::{NOTICES_ID, OBSERVATION_INFO_ID, PLOTS_ID};
use page::{Document, Element};
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;
use transport::{HttpResponse, TransportError};

fn panel(session: &Session) -> Vec<Element> {
    session
        .page()
        .get(PLOTS_ID)
        .unwrap()
        .child_elements()
        .cloned()
        .collect()
}

#[test]
fn plot_form_posts_serialized_fields() {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    session
        .handle(PageEvent::QualityActivated {
            label: "Bad".to_string(),
        })
        .unwrap();
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);

    assert_eq!(out.request.path, "/plots/plot_data");
    assert_eq!(
        out.request.form,
        vec![
            ("csrfmiddlewaretoken".to_string(), "tok".to_string()),
            ("obs_id".to_string(), OBS_ID.to_string()),
            ("quality".to_string(), "Bad".to_string()),
            ("light_curve".to_string(), ".lc.gz".to_string()),
        ]
    );
    assert!(session.has_pending_plots());
}

#[test]
fn bulk_response_renders_slots_with_forms_in_order() {
    let session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    let children = panel(&session);
    assert_eq!(children.len(), 4);
    assert_eq!(children[0].id(), Some("light_curve"));
    assert!(children[1].has_class("fetch-gti"));
    assert_eq!(children[1].attr("data-slot"), Some("light_curve"));
    assert_eq!(children[2].id(), Some("energy_spectrum"));
    assert!(children[3].has_class("fetch-gti"));

    let placeholder = children[3]
        .find(&|el: &Element| el.attr("name") == Some("gti-search"))
        .unwrap()
        .attr("placeholder");
    assert_eq!(
        placeholder,
        Some("GTI numbers (,) and/or range (-) between 0 and 2")
    );
    assert!(children[0].to_html().contains("Plotly.newPlot"));
    assert_eq!(session.slots().len(), 2);
    assert_eq!(session.slots().obs_id(), OBS_ID);
}

#[test]
fn newer_bulk_submission_wins() {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    let first = submit(&mut session, PageEvent::PlotFormSubmitted);
    let second = submit(&mut session, PageEvent::PlotFormSubmitted);
    assert!(first.request.cancel.is_cancelled());

    let applied = session.deliver(
        &second.ticket,
        Ok(HttpResponse::ok(&bulk_body(&["Second"], &[1]))),
    );
    assert_eq!(applied, Delivery::Applied);
    let late = session.deliver(
        &first.ticket,
        Ok(HttpResponse::ok(&bulk_body(&["First"], &[1]))),
    );
    assert_eq!(late, Delivery::Discarded);
    assert!(session.page().get("second").is_some());
    assert!(session.page().get("first").is_none());
}

#[test]
fn failed_bulk_request_keeps_previous_panel() {
    let mut session = rendered(&["Light Curve"], &[4]);
    let before = session.page().get(PLOTS_ID).unwrap().to_html();

    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let err = TransportError::Status {
        url: "/plots/plot_data".to_string(),
        status: 503,
    };
    let delivery = session.deliver(&out.ticket, Err(err.clone()));
    assert_eq!(delivery, Delivery::Failed(PlotError::Transport(err)));
    assert_eq!(session.page().get(PLOTS_ID).unwrap().to_html(), before);

    let notice = session.notices().latest().unwrap();
    assert!(notice.retryable);
    assert!(session.page().get(NOTICES_ID).unwrap().to_html().contains("notice-error"));
}

#[test]
fn http_error_status_is_a_failure() {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let delivery = session.deliver(
        &out.ticket,
        Ok(HttpResponse {
            status: 500,
            body: "oops".to_string(),
        }),
    );
    assert!(matches!(
        delivery,
        Delivery::Failed(PlotError::Transport(TransportError::Status { status: 500, .. }))
    ));
}

#[test]
fn malformed_bulk_response_keeps_previous_panel() {
    let mut session = rendered(&["Light Curve"], &[4]);
    let before = session.page().get(PLOTS_ID).unwrap().to_html();
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let delivery = session.deliver(&out.ticket, Ok(HttpResponse::ok(r#"{"maxGTI": [1]}"#)));
    assert!(matches!(delivery, Delivery::Failed(PlotError::Malformed(_))));
    assert_eq!(session.page().get(PLOTS_ID).unwrap().to_html(), before);
    assert!(!session.notices().latest().unwrap().retryable);
}

#[test]
fn empty_bulk_response_clears_the_panel() {
    let mut session = rendered(&["Light Curve"], &[4]);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let body = json!({ "plotDivs": [], "maxGTI": [] }).to_string();
    assert_eq!(session.deliver(&out.ticket, Ok(HttpResponse::ok(&body))), Delivery::Applied);
    assert!(panel(&session).is_empty());
    assert!(session.slots().is_empty());
}

#[test]
fn duplicate_titles_get_distinct_slots() {
    let session = rendered(&["Light Curve", "Light Curve"], &[2, 2]);
    assert!(session.page().get("light_curve").is_some());
    assert!(session.page().get("light_curve_2").is_some());
    assert_eq!(session.page().root().count_by_id("light_curve"), 1);
}

#[test]
fn fragment_without_title_becomes_placeholder() {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let body = json!({
        "plotDivs": ["<div>broken</div>", fragment("Light Curve")],
        "maxGTI": [3, 3],
    })
    .to_string();
    assert_eq!(session.deliver(&out.ticket, Ok(HttpResponse::ok(&body))), Delivery::Applied);

    let placeholder = session.page().get("plot_1").unwrap();
    assert!(placeholder.has_class("plot-unavailable"));
    assert_eq!(panel(&session).len(), 3);
    let result = session.handle(PageEvent::GtiFormSubmitted {
        slot: "plot_1".to_string(),
    });
    assert!(matches!(result, Err(PlotError::UnknownSlot(slot)) if slot == "plot_1"));
}

#[test]
fn missing_or_zero_max_gti() {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let body = json!({
        "plotDivs": [fragment("Light Curve"), fragment("Spectrum")],
        "maxGTI": [0],
    })
    .to_string();
    assert_eq!(session.deliver(&out.ticket, Ok(HttpResponse::ok(&body))), Delivery::Applied);

    let children = panel(&session);
    let search = children[1]
        .find(&|el: &Element| el.attr("name") == Some("gti-search"))
        .unwrap();
    assert!(search.has_attr("disabled"));
    assert_eq!(search.attr("placeholder"), Some("No GTIs available"));
    assert!(children[3].has_class("gti-unavailable"));
}

#[test]
fn explicit_slot_ids_are_used() {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let body = json!({
        "plotDivs": [fragment("Light Curve")],
        "maxGTI": [2],
        "slotIds": ["lc-main"],
    })
    .to_string();
    session.deliver(&out.ticket, Ok(HttpResponse::ok(&body)));
    assert!(session.page().get("lc-main").is_some());
    assert!(session.page().get("light_curve").is_none());
}

#[test]
fn info_table_is_rendered_and_typeset() {
    struct Counting(Rc<Cell<usize>>);
    impl Typesetter for Counting {
        fn typeset(&mut self, _page: &mut Document) {
            self.0.set(self.0.get() + 1);
        }
    }

    let count = Rc::new(Cell::new(0));
    let mut session = session().with_typesetter(Box::new(Counting(count.clone())));
    fill_plot_form(&mut session, OBS_ID);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let body = json!({
        "plotDivs": [fragment("Light Curve")],
        "maxGTI": [2],
        "info": [{ "EXPOSURE": 1500.5, "OBS_ID": "1234567890" }],
    })
    .to_string();
    session.deliver(&out.ticket, Ok(HttpResponse::ok(&body)));

    let info = session.page().get(OBSERVATION_INFO_ID).unwrap();
    let headers: Vec<String> = info
        .find_all_by_class("info-table")
        .first()
        .unwrap()
        .descendants()
        .into_iter()
        .filter(|el| el.tag() == "th")
        .map(|el| el.text_content())
        .collect();
    assert_eq!(headers, vec!["EXPOSURE", "OBS_ID"]);
    assert!(info.to_html().contains("<td>1500.5</td>"));
    assert_eq!(count.get(), 1);
}

#[test]
fn identical_submissions_render_identically() {
    let a = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    let b = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    assert_eq!(a.render_page(), b.render_page());
}

#[test]
fn cancelled_completion_is_discarded_silently() {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    assert_eq!(
        session.deliver(&out.ticket, Err(TransportError::Cancelled)),
        Delivery::Discarded
    );
    assert!(session.notices().is_empty());
    assert!(!session.has_pending_plots());
}
