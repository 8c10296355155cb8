fn main() -> color_eyre::eyre::Result<()> {
    secretsmanager_loader::cli::main()
}
