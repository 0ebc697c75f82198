//! labhost binary entry point

fn main() -> anyhow::Result<()> {
    labhost::run()
}
