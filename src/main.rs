fn main() {
    lineage::cli::run();
}
