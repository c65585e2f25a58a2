pub mod case;
pub mod document;
pub mod payload;
pub mod template;
pub mod template_data;
