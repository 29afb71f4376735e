use anyhow::Result;
use travelsplit_cli::app;

fn main() -> Result<()> {
    app::run()
}
