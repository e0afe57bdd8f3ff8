fn main() {
    if let Err(err) = multitrivia_lib::run() {
        log::error!("{err:?}");
        eprintln!("multitrivia: {err:#}");
        std::process::exit(1);
    }
}
