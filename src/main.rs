mod config;
mod hooks;
mod models;
mod services;
mod state;
mod utils;
mod views;
mod web;

use views::App;

fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("🚀 Team Planner starting...");

    yew::Renderer::<App>::new().render();
}
