//! Forno demo driver
//!
//! Headless rendition of the pizza-creator page: builds the catalog and
//! facade, subscribes to the view model the way the UI would, then scripts
//! a user session against the mutators (typing into the debounced search
//! box, composing a pizza on the form, submitting it, paging).

use anyhow::Result;
use clap::Parser;
use forno_app::{Catalog, FacadeConfig, OperationKind, Pizza, PizzaFacade, PizzaForm, PizzaState};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "forno")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pizza creator demo over the Forno facade", long_about = None)]
struct Cli {
    /// Simulated remote latency in milliseconds
    #[arg(long, default_value = "750")]
    latency_ms: u64,

    /// Quiet window for the debounced search box in milliseconds
    #[arg(long, default_value = "300")]
    debounce_ms: u64,

    /// Print every view-model emission as a JSON line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let latency = Duration::from_millis(cli.latency_ms);
    let config = FacadeConfig {
        remote_latency: latency,
        debounce_window: Duration::from_millis(cli.debounce_ms),
        ..FacadeConfig::default()
    };

    let catalog = Arc::new(Catalog::new());
    let facade = PizzaFacade::new(catalog, config)?;

    // The UI: render every view-model emission.
    let json = cli.json;
    let _vm_sub = facade.vm().subscribe(move |vm: &PizzaState| {
        if json {
            if let Ok(line) = serde_json::to_string(vm) {
                println!("{line}");
            }
        } else {
            println!(
                "[vm] pizzas={:<2} toppings={} search={:?} page={}x{} loading={} counter={}",
                vm.pizzas.len(),
                vm.toppings.len(),
                vm.pizza_search,
                vm.pagination.current_page,
                vm.pagination.selected_size,
                vm.loading,
                vm.counter,
            );
        }
    });

    info!("initial load complete, starting scripted session");

    // Type into the debounced search box, one keystroke at a time.
    let search = facade.search_input();
    for text in ["p", "pe", "pep"] {
        search.push(text);
        thread::sleep(Duration::from_millis(cli.debounce_ms / 4));
    }
    thread::sleep(Duration::from_millis(cli.debounce_ms * 2));
    info!(results = facade.snapshot().pizzas.len(), "search settled");

    // Clear the search and compose a pizza on the form.
    search.push("");
    thread::sleep(Duration::from_millis(cli.debounce_ms * 2));

    let mut form = PizzaForm::new();
    form.set_name("Blazin' hot");
    for topping in ["Jalapenos", "Chicken", "Herbs"] {
        form.toggle_topping(topping);
        facade.emit_latest();
    }

    match form.submit() {
        Ok(pizza) => {
            info!(name = %pizza.name, "submitting form");
            facade.add_pizza(pizza);
        }
        Err(err) => info!(%err, "form rejected"),
    }
    thread::sleep(latency + Duration::from_millis(50));

    // Page through the (now longer) list.
    facade.update_pagination(10, 0)?;

    // And retire one of the classics.
    facade.do_operation(OperationKind::Delete, Pizza::new("Hawaiian", vec![]));
    thread::sleep(latency + Duration::from_millis(50));

    let final_state = facade.snapshot();
    info!(
        pizzas = final_state.pizzas.len(),
        failures = final_state.last_failure.is_some(),
        "session finished"
    );
    println!(
        "final pizzas: {}",
        final_state
            .pizzas
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}
