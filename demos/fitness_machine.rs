#[cfg(target_os = "linux")]
use ftms_peripheral::{
    application::Application,
    config::ServerConfig,
    gatt::peripheral_event::PeripheralEvent,
    profile::value_source::RandomValueSource,
    server::{runner, GattServer},
    Peripheral, PeripheralImpl,
};
#[cfg(target_os = "linux")]
use tokio::{runtime::Builder, sync::mpsc};

#[cfg(target_os = "linux")]
fn main() {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    runtime.block_on(start_app());
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("The fitness machine demo needs BlueZ (Linux)");
}

#[cfg(target_os = "linux")]
async fn start_app() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    if let Err(err) = pretty_env_logger::try_init() {
        eprintln!("WARNING: failed to initialize logging framework: {}", err);
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            return;
        }
    };
    let application = match Application::fitness_machine(&config) {
        Ok(application) => application,
        Err(err) => {
            log::error!("Invalid service catalog: {}", err);
            return;
        }
    };

    let (sender_tx, receiver_rx) = mpsc::channel::<PeripheralEvent>(256);
    let mut peripheral = match Peripheral::new(sender_tx).await {
        Ok(peripheral) => peripheral,
        Err(err) => {
            log::error!("Error creating peripheral: {}", err);
            return;
        }
    };

    while !peripheral.is_powered().await.unwrap_or(false) {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    if let Err(err) = application.register(&mut peripheral).await {
        log::error!("Error adding services: {}", err);
        return;
    }

    if let Err(err) = peripheral
        .start_advertising(application.advertisement())
        .await
    {
        log::error!("Error starting advertising: {}", err);
        return;
    }
    log::info!("Advertising as {}", config.local_name);

    let mut server = GattServer::new(
        application,
        &config,
        Box::new(RandomValueSource::default()),
    );
    runner::run(&mut peripheral, &mut server, receiver_rx).await;
}
