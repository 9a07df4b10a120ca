//! Morpheus resource types
//!
//! One module per resource type, each providing its schema and a
//! [`FieldMapper`](crate::resource::mapper::FieldMapper). The generic
//! lifecycle lives in [`crate::resource::reconciler`].

pub mod api_option_list;
pub mod checkbox_option_type;
pub mod powershell_script_task;
pub mod typeahead_option_type;

mod option_type;

pub use api_option_list::ApiOptionList;
pub use checkbox_option_type::CheckboxOptionType;
pub use powershell_script_task::PowerShellScriptTask;
pub use typeahead_option_type::TypeaheadOptionType;
