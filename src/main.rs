fn main() -> anyhow::Result<()> {
    hover_view::run(hover_view::ViewerConfig::default())
}
