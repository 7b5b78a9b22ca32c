fn main() -> anyhow::Result<()> {
    portfolio_scene::run(portfolio_scene::SceneConfig::default())
}
