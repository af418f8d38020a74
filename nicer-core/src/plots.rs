use crate::error::PlotError;
use crate::gti::{build_gti_form, gti_unavailable};
use crate::protocol::{info_table, BulkPlotResponse, FIELD_OBS_ID};
use crate::session::{
    check_response, Delivery, OutgoingRequest, PendingBulk, RequestKind, Session,
};
use crate::slot_id::{resolve_slot_id, SlotId};
use page::document::{OBSERVATION_INFO_ID, PLOTS_ID, PLOT_FORM_ID};
use page::{serialize_form, Element};
use transport::{CancelToken, HttpRequest, HttpResponse, TransportError};

pub const PLOT_SLOT_CLASS: &str = "plot-slot";
pub const PLOT_UNAVAILABLE_CLASS: &str = "plot-unavailable";

pub(crate) fn plot_slot(id: &SlotId, fragment: &str) -> Element {
    Element::new("div")
        .with_id(id.as_str())
        .with_class(PLOT_SLOT_CLASS)
        .with_raw(fragment)
}

pub(crate) fn unavailable_slot(id: &SlotId, message: &str) -> Element {
    Element::new("div")
        .with_id(id.as_str())
        .with_class(PLOT_SLOT_CLASS)
        .with_class(PLOT_UNAVAILABLE_CLASS)
        .with_child(Element::new("p").with_text(message))
}

impl Session {
    /// Serializes the plot form and posts it. Any earlier bulk request and
    /// every in-flight refinement is cancelled.
    pub(crate) fn submit_plot_form(&mut self) -> Result<Vec<OutgoingRequest>, PlotError> {
        let form = self
            .page
            .get(PLOT_FORM_ID)
            .ok_or_else(|| PlotError::MissingElement(PLOT_FORM_ID.to_string()))?;
        let fields = serialize_form(form);
        let obs_id = fields
            .iter()
            .find(|(name, _)| name == FIELD_OBS_ID)
            .map(|(_, value)| value.clone())
            .unwrap_or_default();

        if let Some(previous) = self.pending_bulk.take() {
            log::debug!("plot request #{} superseded", previous.seq);
            previous.cancel.cancel();
        }
        let cancelled = self.slots.cancel_in_flight();
        if cancelled > 0 {
            log::debug!("cancelled {cancelled} in-flight refinement(s)");
        }

        let ticket = self.next_ticket(RequestKind::Plots);
        let cancel = CancelToken::new();
        self.pending_bulk = Some(PendingBulk {
            seq: ticket.seq,
            obs_id: obs_id.clone(),
            cancel: cancel.clone(),
        });
        log::info!("requesting plots for observation '{obs_id}' (#{})", ticket.seq);
        let request =
            HttpRequest::post(&self.settings.endpoints.plot_data, fields).with_cancel(cancel);
        Ok(vec![OutgoingRequest { ticket, request }])
    }

    pub(crate) fn apply_plots(
        &mut self,
        seq: u64,
        result: Result<HttpResponse, TransportError>,
    ) -> Delivery {
        let pending = match self.pending_bulk.take() {
            Some(pending) if pending.seq == seq => pending,
            other => {
                self.pending_bulk = other;
                log::debug!("plot response #{seq} is no longer current");
                return Delivery::Discarded;
            }
        };

        let response = match check_response(&self.settings.endpoints.plot_data, result) {
            Ok(response) => response,
            Err(err) => {
                log::warn!("plot request #{seq} failed: {err}");
                self.notify_error("Could not load plots", &err);
                return Delivery::Failed(err);
            }
        };
        let parsed = match BulkPlotResponse::parse(&response.body) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("plot response #{seq} is malformed: {err}");
                self.notify_error("Plots unavailable", &err);
                return Delivery::Failed(err);
            }
        };
        self.render_plots(&parsed, &pending.obs_id);
        Delivery::Applied
    }

    fn render_plots(&mut self, response: &BulkPlotResponse, submitted_obs_id: &str) {
        let obs_id = response
            .observation_id()
            .unwrap_or_else(|| submitted_obs_id.to_string());

        if let Some(records) = &response.info {
            let table = info_table(records);
            if let Some(info) = self.page.get_mut(OBSERVATION_INFO_ID) {
                info.clear_children();
                info.append(table);
            }
        }

        if let Some(panel) = self.page.get_mut(PLOTS_ID) {
            panel.clear_children();
        }
        let generation = self.slots.begin_render(&obs_id);
        let page_ids: Vec<String> = self
            .page
            .root()
            .descendants()
            .into_iter()
            .filter_map(Element::id)
            .map(str::to_string)
            .collect();
        self.slots.reserve(page_ids);

        let mut entries = Vec::with_capacity(response.plot_divs.len() * 2);
        for (idx, fragment) in response.plot_divs.iter().enumerate() {
            match resolve_slot_id(response.slot_id_at(idx), fragment) {
                Ok(base) => {
                    let max_gti = response.max_gti_at(idx);
                    let id = self.slots.insert(base.clone(), max_gti);
                    if id != base {
                        log::warn!("plot id '{base}' is taken, rendering as '{id}'");
                    }
                    entries.push(plot_slot(&id, fragment));
                    match max_gti {
                        Some(max) => entries.push(build_gti_form(
                            max,
                            &id,
                            &base,
                            &self.settings.min_counts,
                        )),
                        None => {
                            log::warn!("no usable maxGTI for plot '{id}'");
                            entries.push(gti_unavailable(&id));
                        }
                    }
                }
                Err(err) => {
                    let id = self
                        .slots
                        .insert(SlotId::new(&format!("plot_{}", idx + 1)), None);
                    log::warn!(
                        "plot {} has no identifier ({err}); showing placeholder '{id}'",
                        idx + 1
                    );
                    entries.push(unavailable_slot(&id, "Plot unavailable"));
                }
            }
        }

        if let Some(panel) = self.page.get_mut(PLOTS_ID) {
            for entry in entries {
                panel.append(entry);
            }
        }
        self.typesetter.typeset(&mut self.page);
        log::info!(
            "rendered {} plot(s) for observation '{obs_id}' (generation {generation})",
            self.slots.len()
        );
    }
}
