fn main() {
    #[cfg(feature = "cli")]
    mvtread::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("mvtread: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
