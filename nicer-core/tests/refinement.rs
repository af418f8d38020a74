mod common;

use common::*;
use nicer_core::{ClientSettings, Delivery, GtiSpecError, NoticeLevel, PageEvent, PlotError};
use serde_json::json;
use transport::{HttpResponse, TransportError};

#[test]
fn refinement_posts_form_with_context_fields() {
    let mut session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    session
        .handle(PageEvent::QualityActivated {
            label: "Bad".to_string(),
        })
        .unwrap();
    session
        .handle(PageEvent::GtiSearchInput {
            slot: "light_curve".to_string(),
            text: "0,2-3".to_string(),
        })
        .unwrap();
    session
        .handle(PageEvent::MinValueInput {
            slot: "light_curve".to_string(),
            value: 50,
        })
        .unwrap();

    let out = refine(&mut session, "light_curve");
    assert_eq!(out.request.path, "/plots/plot_gti");
    assert_eq!(
        out.request.form,
        vec![
            ("plot_type".to_string(), "light_curve".to_string()),
            ("gti-search".to_string(), "0,2-3".to_string()),
            ("min_value".to_string(), "50".to_string()),
            ("csrfmiddlewaretoken".to_string(), "tok".to_string()),
            ("quality".to_string(), "bad".to_string()),
            ("obs_id".to_string(), OBS_ID.to_string()),
        ]
    );
}

#[test]
fn slider_input_updates_label_and_clamps() {
    let mut session = rendered(&["Light Curve"], &[5]);
    session
        .handle(PageEvent::MinValueInput {
            slot: "light_curve".to_string(),
            value: 999,
        })
        .unwrap();
    let label = session.page().get("light_curve-min-value").unwrap();
    assert_eq!(label.text_content(), "Value: 200 counts");
    let slider = session.page().get("light_curve-min-slider").unwrap();
    assert_eq!(slider.attr("value"), Some("200"));
}

#[test]
fn quality_is_empty_until_chosen() {
    let mut session = rendered(&["Light Curve"], &[5]);
    let out = refine(&mut session, "light_curve");
    assert_eq!(out.request.form_value("quality"), Some(""));
}

#[test]
fn refinement_replaces_only_its_slot() {
    let mut session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    let untouched = slot_html(&session, "energy_spectrum");
    let out = refine(&mut session, "light_curve");

    let delivery = session.deliver(
        &out.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "refined"))),
    );
    assert_eq!(delivery, Delivery::Applied);
    assert!(slot_html(&session, "light_curve").contains("refined"));
    assert_eq!(slot_html(&session, "energy_spectrum"), untouched);
    assert_eq!(session.page().root().count_by_id("light_curve"), 1);
    assert!(session.slots().in_flight(&nicer_core::SlotId::new("light_curve")).is_none());
}

#[test]
fn later_refinement_supersedes_earlier_one() {
    let mut session = rendered(&["Light Curve"], &[5]);
    let first = refine(&mut session, "light_curve");
    let second = refine(&mut session, "light_curve");
    assert!(first.request.cancel.is_cancelled());
    assert!(second.ticket.seq > first.ticket.seq);

    let late = session.deliver(
        &first.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "first"))),
    );
    assert_eq!(late, Delivery::Discarded);
    assert!(!slot_html(&session, "light_curve").contains("first"));

    let applied = session.deliver(
        &second.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "second"))),
    );
    assert_eq!(applied, Delivery::Applied);
    assert!(slot_html(&session, "light_curve").contains("second"));

    // The older answer arriving last still loses.
    let later = session.deliver(
        &first.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "first"))),
    );
    assert_eq!(later, Delivery::Discarded);
    assert!(slot_html(&session, "light_curve").contains("second"));
}

#[test]
fn refinements_of_different_slots_complete_in_any_order() {
    let mut session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    let lc = refine(&mut session, "light_curve");
    let spec = refine(&mut session, "energy_spectrum");
    assert!(!lc.request.cancel.is_cancelled());

    assert_eq!(
        session.deliver(
            &spec.ticket,
            Ok(HttpResponse::ok(&refinement_body("Energy Spectrum", "marker-spec")))
        ),
        Delivery::Applied
    );
    assert_eq!(
        session.deliver(
            &lc.ticket,
            Ok(HttpResponse::ok(&refinement_body("Light Curve", "marker-lc")))
        ),
        Delivery::Applied
    );
    assert!(slot_html(&session, "light_curve").contains("marker-lc"));
    assert!(slot_html(&session, "energy_spectrum").contains("marker-spec"));
}

#[test]
fn bulk_submission_discards_inflight_refinements() {
    let mut session = rendered(&["Light Curve"], &[5]);
    let refinement = refine(&mut session, "light_curve");
    let bulk = submit(&mut session, PageEvent::PlotFormSubmitted);
    assert!(refinement.request.cancel.is_cancelled());

    session.deliver(
        &bulk.ticket,
        Ok(HttpResponse::ok(&bulk_body(&["Light Curve"], &[5]))),
    );
    let late = session.deliver(
        &refinement.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "stale"))),
    );
    assert_eq!(late, Delivery::Discarded);
    assert!(!slot_html(&session, "light_curve").contains("stale"));
}

#[test]
fn refinement_for_duplicate_slot_targets_that_slot() {
    let mut session = rendered(&["Light Curve", "Light Curve"], &[2, 2]);
    let first = slot_html(&session, "light_curve");
    let out = refine(&mut session, "light_curve_2");
    assert_eq!(out.request.form_value("plot_type"), Some("light_curve"));

    session.deliver(
        &out.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "dup"))),
    );
    assert!(slot_html(&session, "light_curve_2").contains("dup"));
    assert_eq!(slot_html(&session, "light_curve"), first);
}

#[test]
fn response_naming_another_plot_replaces_requested_slot() {
    let mut session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    let spectrum = slot_html(&session, "energy_spectrum");
    let out = refine(&mut session, "light_curve");
    let delivery = session.deliver(
        &out.ticket,
        Ok(HttpResponse::ok(&refinement_body("Renamed Curve", "orphan"))),
    );
    assert_eq!(delivery, Delivery::Applied);
    assert!(slot_html(&session, "light_curve").contains("orphan"));
    assert_eq!(slot_html(&session, "energy_spectrum"), spectrum);
    assert!(session.page().get("renamed_curve").is_none());
}

#[test]
fn plot_titled_like_page_panel_refines_only_itself() {
    let mut session = rendered(&["Plots", "Light Curve"], &[3, 3]);
    let ids: Vec<&str> = session.slots().slots().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["plots_2", "light_curve"]);
    let curve = slot_html(&session, "light_curve");

    let out = refine(&mut session, "plots_2");
    assert_eq!(out.request.form_value("plot_type"), Some("plots"));
    let delivery = session.deliver(
        &out.ticket,
        Ok(HttpResponse::ok(&refinement_body("Plots", "new"))),
    );
    assert_eq!(delivery, Delivery::Applied);
    assert!(slot_html(&session, "plots_2").contains("new"));
    assert_eq!(slot_html(&session, "light_curve"), curve);
    assert_eq!(
        session.page().root().find_all_by_class("fetch-gti").len(),
        2
    );
    assert_eq!(session.page().root().count_by_id("plots"), 1);
}

#[test]
fn malformed_refinement_never_touches_page_elements() {
    let mut session = rendered(&["Notices", "Light Curve"], &[3, 3]);
    let out = refine(&mut session, "notices_2");
    session.deliver(&out.ticket, Ok(HttpResponse::ok("not json")));
    assert!(slot_html(&session, "notices_2").contains("Plot unavailable"));
    assert_eq!(session.page().root().count_by_id("notices"), 1);
    assert!(session.page().get("plots").is_some());
}

#[test]
fn response_naming_live_plot_replaces_that_plot() {
    let mut session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    let curve = slot_html(&session, "light_curve");
    let out = refine(&mut session, "light_curve");
    let delivery = session.deliver(
        &out.ticket,
        Ok(HttpResponse::ok(&refinement_body("Energy Spectrum", "moved"))),
    );
    assert_eq!(delivery, Delivery::Applied);
    assert!(slot_html(&session, "energy_spectrum").contains("moved"));
    assert_eq!(slot_html(&session, "light_curve"), curve);
}

#[test]
fn malformed_refinement_shows_placeholder_for_that_slot() {
    let mut session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    let spectrum = slot_html(&session, "energy_spectrum");
    let out = refine(&mut session, "light_curve");
    let body = json!({ "plotDivs": [] }).to_string();

    let delivery = session.deliver(&out.ticket, Ok(HttpResponse::ok(&body)));
    assert!(matches!(delivery, Delivery::Failed(PlotError::Malformed(_))));
    let slot = session.page().get("light_curve").unwrap();
    assert!(slot.has_class("plot-unavailable"));
    assert_eq!(slot_html(&session, "energy_spectrum"), spectrum);
}

#[test]
fn failed_refinement_keeps_slot_and_notifies() {
    let mut session = rendered(&["Light Curve"], &[5]);
    let before = slot_html(&session, "light_curve");
    let out = refine(&mut session, "light_curve");
    let delivery = session.deliver(
        &out.ticket,
        Err(TransportError::Timeout {
            url: "/plots/plot_gti".to_string(),
        }),
    );
    assert!(matches!(delivery, Delivery::Failed(PlotError::Transport(_))));
    assert_eq!(slot_html(&session, "light_curve"), before);
    let notice = session.notices().latest().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.retryable);
}

#[test]
fn unknown_slot_is_rejected() {
    let mut session = rendered(&["Light Curve"], &[5]);
    let result = session.handle(PageEvent::GtiFormSubmitted {
        slot: "nope".to_string(),
    });
    assert!(matches!(result, Err(PlotError::UnknownSlot(_))));
}

#[test]
fn rotated_csrf_token_is_sent() {
    let mut session = rendered(&["Light Curve"], &[5]);
    session
        .handle(PageEvent::CsrfTokenRotated {
            token: "fresh".to_string(),
        })
        .unwrap();
    let out = refine(&mut session, "light_curve");
    assert_eq!(out.request.form_value("csrfmiddlewaretoken"), Some("fresh"));
    assert_eq!(session.csrf_token(), "fresh");
}

#[test]
fn submitted_obs_id_is_used_when_response_has_none() {
    let mut session = session();
    fill_plot_form(&mut session, "555");
    let bulk = submit(&mut session, PageEvent::PlotFormSubmitted);
    let body = json!({ "plotDivs": [fragment("Light Curve")], "maxGTI": [2] }).to_string();
    session.deliver(&bulk.ticket, Ok(HttpResponse::ok(&body)));

    let out = refine(&mut session, "light_curve");
    assert_eq!(out.request.form_value("obs_id"), Some("555"));
}

#[test]
fn prevalidation_rejects_out_of_range_selection() {
    let settings = ClientSettings {
        prevalidate_gti: true,
        ..ClientSettings::default()
    };
    let mut session = session_with(settings);
    fill_plot_form(&mut session, OBS_ID);
    let bulk = submit(&mut session, PageEvent::PlotFormSubmitted);
    session.deliver(
        &bulk.ticket,
        Ok(HttpResponse::ok(&bulk_body(&["Light Curve"], &[5]))),
    );
    session
        .handle(PageEvent::GtiSearchInput {
            slot: "light_curve".to_string(),
            text: "9".to_string(),
        })
        .unwrap();

    let result = session.handle(PageEvent::GtiFormSubmitted {
        slot: "light_curve".to_string(),
    });
    assert!(matches!(
        result,
        Err(PlotError::Validation(GtiSpecError::OutOfRange { value: 9, last: 4 }))
    ));
    assert_eq!(session.notices().latest().unwrap().level, NoticeLevel::Warning);
    assert!(session
        .slots()
        .in_flight(&nicer_core::SlotId::new("light_curve"))
        .is_none());
}

#[test]
fn light_curve_obs1_scenario() {
    let mut session = session();
    fill_plot_form(&mut session, "OBS1");
    let bulk = submit(&mut session, PageEvent::PlotFormSubmitted);
    let body = json!({
        "plotDivs": [r#"<div class="plot">{"title":{"text":"Light Curve"}}</div>"#],
        "maxGTI": [12],
        "obsID": "OBS1",
    })
    .to_string();
    assert_eq!(session.deliver(&bulk.ticket, Ok(HttpResponse::ok(&body))), Delivery::Applied);
    assert_eq!(session.page().root().count_by_id("light_curve"), 1);
    let forms = session.page().root().find_all_by_class("fetch-gti");
    assert_eq!(forms.len(), 1);
    assert!(forms[0].to_html().contains("between 0 and 11"));

    session
        .handle(PageEvent::QualityActivated {
            label: "Good".to_string(),
        })
        .unwrap();
    session
        .handle(PageEvent::GtiSearchInput {
            slot: "light_curve".to_string(),
            text: "0,2-4".to_string(),
        })
        .unwrap();
    session
        .handle(PageEvent::MinValueInput {
            slot: "light_curve".to_string(),
            value: 150,
        })
        .unwrap();
    let out = refine(&mut session, "light_curve");
    assert_eq!(
        out.request.encoded_form().unwrap(),
        "plot_type=light_curve&gti-search=0%2C2-4&min_value=150\
         &csrfmiddlewaretoken=tok&quality=good&obs_id=OBS1"
    );

    let refined = json!({
        "plotDivs": [r#"<div class="plot">{"title":{"text":"Light Curve"}}<!-- gti --></div>"#],
    })
    .to_string();
    assert_eq!(session.deliver(&out.ticket, Ok(HttpResponse::ok(&refined))), Delivery::Applied);
    assert!(slot_html(&session, "light_curve").contains("<!-- gti -->"));
    assert_eq!(session.page().root().find_all_by_class("fetch-gti").len(), 1);
}

#[test]
fn good_quality_button_scenario() {
    let mut session = session();
    session
        .handle(PageEvent::QualityActivated {
            label: "Good".to_string(),
        })
        .unwrap();
    assert_eq!(session.quality().current(), Some("good"));
    let select = session
        .page()
        .get(page::document::QUALITY_SELECT_ID)
        .unwrap();
    assert_eq!(page::form::selected_value(select).as_deref(), Some("Good"));
}

#[test]
fn repeated_identical_refinement_renders_the_same_fragment() {
    let mut session = rendered(&["Light Curve", "Energy Spectrum"], &[5, 3]);
    session
        .handle(PageEvent::GtiSearchInput {
            slot: "light_curve".to_string(),
            text: "1-2".to_string(),
        })
        .unwrap();

    let first = refine(&mut session, "light_curve");
    session.deliver(
        &first.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "same"))),
    );
    let after_first = slot_html(&session, "light_curve");

    let second = refine(&mut session, "light_curve");
    assert_eq!(first.request.form, second.request.form);
    session.deliver(
        &second.ticket,
        Ok(HttpResponse::ok(&refinement_body("Light Curve", "same"))),
    );
    assert_eq!(slot_html(&session, "light_curve"), after_first);
}
