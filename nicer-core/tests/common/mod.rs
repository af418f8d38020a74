#![allow(dead_code)]

use nicer_core::{ClientSettings, OutgoingRequest, PageEvent, Session};
use serde_json::json;

pub const OBS_ID: &str = "1234567890";

pub fn fragment(title: &str) -> String {
    format!(r#"<div class="plotly"></div><script>Plotly.newPlot("p", [], {{"title":{{"text":"{title}"}}}})</script>"#)
}

pub fn session_with(settings: ClientSettings) -> Session {
    let mut session = Session::new(settings);
    session.set_csrf_token("tok");
    session
}

pub fn session() -> Session {
    session_with(ClientSettings::default())
}

pub fn fill_plot_form(session: &mut Session, obs_id: &str) {
    session
        .handle(PageEvent::FieldInput {
            name: "obs_id".to_string(),
            value: obs_id.to_string(),
        })
        .unwrap();
    session
        .handle(PageEvent::PlotTypeToggled {
            name: "light_curve".to_string(),
            checked: true,
        })
        .unwrap();
}

pub fn submit(session: &mut Session, event: PageEvent) -> OutgoingRequest {
    let mut out = session.handle(event).unwrap();
    assert_eq!(out.len(), 1);
    out.remove(0)
}

pub fn bulk_body(titles: &[&str], max_gti: &[u32]) -> String {
    let divs: Vec<String> = titles.iter().map(|t| fragment(t)).collect();
    json!({ "plotDivs": divs, "maxGTI": max_gti, "obsID": OBS_ID }).to_string()
}

pub fn refinement_body(title: &str, marker: &str) -> String {
    json!({ "plotDivs": [format!("{}<!-- {marker} -->", fragment(title))] }).to_string()
}

/// Session with a rendered panel of the given plots.
pub fn rendered(titles: &[&str], max_gti: &[u32]) -> Session {
    let mut session = session();
    fill_plot_form(&mut session, OBS_ID);
    let out = submit(&mut session, PageEvent::PlotFormSubmitted);
    let delivery = session.deliver(
        &out.ticket,
        Ok(transport::HttpResponse::ok(&bulk_body(titles, max_gti))),
    );
    assert_eq!(delivery, nicer_core::Delivery::Applied);
    session
}

pub fn slot_html(session: &Session, id: &str) -> String {
    session
        .page()
        .get(id)
        .map(|el| el.to_html())
        .unwrap_or_default()
}

pub fn refine(session: &mut Session, slot: &str) -> OutgoingRequest {
    submit(
        session,
        PageEvent::GtiFormSubmitted {
            slot: slot.to_string(),
        },
    )
}
