fn main() {
    // Build-time secrets baked into the device image (see config::secrets).
    for var in [
        "GREENHOUSE_WIFI_SSID",
        "GREENHOUSE_WIFI_PSK",
        "GREENHOUSE_API_KEY",
        "GREENHOUSE_DEVICE_ID",
        "GREENHOUSE_BACKEND_HOST",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
