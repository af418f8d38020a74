pub mod autocomplete;
pub mod dropdown;
pub mod error;
pub mod gti;
pub mod notices;
pub mod plots;
pub mod protocol;
pub mod quality;
mod refine;
pub mod session;
pub mod settings;
pub mod slot_id;
pub mod slots;

pub use autocomplete::{Autocomplete, SuggestionMode};
pub use dropdown::{bind_dropdowns, DropdownBinding, DropdownController, DropdownState};
pub use error::PlotError;
pub use gti::{build_gti_form, parse_gti_spec, GtiSpecError};
pub use notices::{Notice, NoticeBoard, NoticeLevel};
pub use quality::QualitySelector;
pub use session::{
    Delivery, NoopTypesetter, OutgoingRequest, PageEvent, RequestKind, RequestTicket, Session,
    Typesetter,
};
pub use settings::{load_settings_file, normalize_settings, ClientSettings, SettingsError};
pub use slot_id::{derive_slot_id, resolve_slot_id, SlotId, SlotIdError};
pub use slots::{PlotSlot, SlotRegistry};
