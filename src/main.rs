fn main() {
    #[cfg(target_arch = "wasm32")]
    repair_console::boot();

    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("repair-console runs in the browser; build it with `trunk build`");
}
