pub mod chart;
pub mod controls;
pub mod datatable;
pub mod debug;
pub mod dialog;
pub mod info;
pub mod menu;
pub mod text_input;
pub mod toolbar;
