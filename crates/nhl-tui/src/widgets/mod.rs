pub mod pane_chrome;
