fn main() -> utxohash_cli::Result<()> {
    utxohash_cli::run()
}
