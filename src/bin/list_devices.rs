// Dump all audio devices visible to the platform backend, input first, in
// the same shape the library reports them: portable id, interface name,
// endpoint name, and derived connection state. `--json` emits the raw maps
// instead of the human-readable listing.

use tracing_subscriber::EnvFilter;

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn dump_devices<B: audio_endpoints::AudioBackend>(
    manager: &audio_endpoints::AudioDeviceManager<B>,
    direction: audio_endpoints::DeviceDirection,
    json: bool,
) {
    let devices = manager.list_devices(direction);
    if json {
        match serde_json::to_string_pretty(&devices) {
            Ok(out) => println!("{out}"),
            Err(error) => eprintln!("failed to serialize device list: {error}"),
        }
        return;
    }

    for (id, device) in devices {
        println!("\"{}\"", device.display_name);
        println!("\tID:        \"{id}\"");
        println!("\tInterface: \"{}\"", device.interface_name);
        println!("\tEndpoint:  \"{}\"", device.endpoint_name);
        println!("\tState:     {:?}", device.state);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let json = std::env::args().any(|arg| arg == "--json");

    #[cfg(target_os = "macos")]
    {
        let manager = audio_endpoints::AudioDeviceManager::new();
        if !json {
            println!("----- INPUT DEVICES -----");
        }
        dump_devices(&manager, audio_endpoints::DeviceDirection::Input, json);
        if !json {
            println!("----- OUTPUT DEVICES -----");
        }
        dump_devices(&manager, audio_endpoints::DeviceDirection::Output, json);
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = json;
        eprintln!("no audio backend is available for this platform");
        std::process::exit(1);
    }
}
