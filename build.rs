fn main() {
    // Only the firmware image needs the ESP-IDF link environment; host
    // test builds have nothing to generate.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
