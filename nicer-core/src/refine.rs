use crate::error::PlotError;
use crate::gti::{
    clamp_min_value, min_value_label, min_value_label_id, parse_gti_spec, slider_id,
    GTI_FORM_CLASS, SLOT_ATTR,
};
use crate::plots::{plot_slot, unavailable_slot};
use crate::protocol::{
    RefinementResponse, FIELD_CSRF, FIELD_GTI_SEARCH, FIELD_OBS_ID, FIELD_QUALITY,
};
use crate::session::{check_response, Delivery, OutgoingRequest, RequestKind, Session};
use crate::slot_id::{resolve_slot_id, SlotId};
use page::document::PLOTS_ID;
use page::form::field_mut;
use page::{serialize_form, Element};
use transport::{CancelToken, HttpRequest, HttpResponse, TransportError};

fn is_gti_form(el: &Element, slot: &str) -> bool {
    el.tag() == "form" && el.has_class(GTI_FORM_CLASS) && el.attr(SLOT_ATTR) == Some(slot)
}

impl Session {
    fn gti_form(&self, slot: &str) -> Result<&Element, PlotError> {
        self.page
            .get(PLOTS_ID)
            .and_then(|panel| panel.find(&|el: &Element| is_gti_form(el, slot)))
            .ok_or_else(|| PlotError::UnknownSlot(slot.to_string()))
    }

    fn gti_form_mut(&mut self, slot: &str) -> Result<&mut Element, PlotError> {
        self.page
            .get_mut(PLOTS_ID)
            .and_then(|panel| panel.find_mut(&|el: &Element| is_gti_form(el, slot)))
            .ok_or_else(|| PlotError::UnknownSlot(slot.to_string()))
    }

    pub(crate) fn set_gti_search(&mut self, slot: &str, text: &str) -> Result<(), PlotError> {
        let form = self.gti_form_mut(slot)?;
        let field = field_mut(form, FIELD_GTI_SEARCH)
            .ok_or_else(|| PlotError::MissingElement(FIELD_GTI_SEARCH.to_string()))?;
        field.set_attr("value", text);
        Ok(())
    }

    /// Moves the slider, clamped to the configured bounds, and updates its label.
    pub(crate) fn set_min_value(&mut self, slot: &str, value: i64) -> Result<u32, PlotError> {
        let clamped = clamp_min_value(value, &self.settings.min_counts);
        let id = SlotId::new(slot);
        let form = self.gti_form_mut(slot)?;
        let slider_id = slider_id(&id);
        form.find_by_id_mut(&slider_id)
            .ok_or(PlotError::MissingElement(slider_id))?
            .set_attr("value", &clamped.to_string());
        let label_id = min_value_label_id(&id);
        form.find_by_id_mut(&label_id)
            .ok_or(PlotError::MissingElement(label_id))?
            .set_text(&min_value_label(clamped));
        Ok(clamped)
    }

    /// Posts one slot's GTI form with the CSRF token, quality and
    /// observation appended. A previous refinement of the slot is cancelled.
    pub(crate) fn submit_gti_form(
        &mut self,
        slot: &str,
    ) -> Result<Vec<OutgoingRequest>, PlotError> {
        let slot_id = SlotId::new(slot);
        let max_gti = self
            .slots
            .get(&slot_id)
            .ok_or_else(|| PlotError::UnknownSlot(slot.to_string()))?
            .max_gti;
        let mut fields = serialize_form(self.gti_form(slot)?);

        if self.settings.prevalidate_gti {
            let text = fields
                .iter()
                .find(|(name, _)| name == FIELD_GTI_SEARCH)
                .map(|(_, value)| value.as_str())
                .unwrap_or("");
            if let Err(err) = parse_gti_spec(text, max_gti.unwrap_or(0)) {
                log::warn!("rejected GTI selection '{text}' for {slot}: {err}");
                self.notify_warning("Invalid GTI selection", &err.to_string());
                return Err(err.into());
            }
        }

        fields.push((FIELD_CSRF.to_string(), self.csrf_token().to_string()));
        fields.push((FIELD_QUALITY.to_string(), self.quality.form_value().to_string()));
        fields.push((FIELD_OBS_ID.to_string(), self.slots.obs_id().to_string()));

        let generation = self.slots.generation();
        let ticket = self.next_ticket(RequestKind::Refinement {
            slot: slot_id.clone(),
            generation,
        });
        let cancel = CancelToken::new();
        self.slots.track(&slot_id, ticket.seq, cancel.clone());
        log::info!("refining {slot} (#{})", ticket.seq);
        let request =
            HttpRequest::post(&self.settings.endpoints.plot_gti, fields).with_cancel(cancel);
        Ok(vec![OutgoingRequest { ticket, request }])
    }

    pub(crate) fn apply_refinement(
        &mut self,
        seq: u64,
        slot: &SlotId,
        generation: u64,
        result: Result<HttpResponse, TransportError>,
    ) -> Delivery {
        if !self.slots.settle(slot, seq, generation) {
            log::debug!("refinement #{seq} for {slot} is stale");
            return Delivery::Discarded;
        }

        let response = match check_response(&self.settings.endpoints.plot_gti, result) {
            Ok(response) => response,
            Err(err) => {
                log::warn!("refinement #{seq} for {slot} failed: {err}");
                self.notify_error(&format!("Could not refresh {slot}"), &err);
                return Delivery::Failed(err);
            }
        };
        let parsed = RefinementResponse::parse(&response.body).and_then(|parsed| {
            parsed
                .plot_divs
                .into_iter()
                .next()
                .map(|fragment| (parsed.slot_id, fragment))
                .ok_or_else(|| PlotError::Malformed("plotDivs is empty".to_string()))
        });
        let (explicit, fragment) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => return self.fail_slot(slot, err),
        };
        let target = match resolve_slot_id(explicit.as_deref(), &fragment) {
            Ok(named) => {
                let base = self.slots.get(slot).map(|s| &s.base);
                if named == *slot || base == Some(&named) {
                    slot.clone()
                } else if self.slots.contains(&named) {
                    log::info!("refinement for {slot} targets live plot '{named}'");
                    named
                } else {
                    log::warn!(
                        "refinement for {slot} names unknown plot '{named}'; replacing {slot}"
                    );
                    slot.clone()
                }
            }
            Err(err) => {
                return self.fail_slot(slot, PlotError::Malformed(err.to_string()));
            }
        };

        if !self.replace_slot(&target, plot_slot(&target, &fragment)) {
            log::warn!("plot slot {target} vanished before its refinement arrived");
            return Delivery::Failed(PlotError::UnknownSlot(target.to_string()));
        }
        self.typesetter.typeset(&mut self.page);
        Delivery::Applied
    }

    /// Swaps one slot element, searching only the plot panel.
    fn replace_slot(&mut self, slot: &SlotId, replacement: Element) -> bool {
        self.page
            .get_mut(PLOTS_ID)
            .map_or(false, |panel| panel.replace_by_id(slot.as_str(), replacement))
    }

    fn fail_slot(&mut self, slot: &SlotId, err: PlotError) -> Delivery {
        log::warn!("refinement for {slot} is malformed: {err}");
        self.replace_slot(slot, unavailable_slot(slot, "Plot unavailable"));
        self.notify_error(&format!("Could not refresh {slot}"), &err);
        Delivery::Failed(err)
    }
}
