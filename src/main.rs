use std::path::PathBuf;

use anyhow::Result;
use camera_quiz_helper::app::App;
use camera_quiz_helper::config::Config;
use camera_quiz_helper::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置：优先 config.toml，否则环境变量
    let config_path = PathBuf::from("config.toml");
    let config = if config_path.exists() {
        Config::from_file(&config_path).await?
    } else {
        Config::from_env()
    };

    // 命令行参数即待处理的图像文件
    let image_paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();

    // 初始化并运行应用
    App::initialize(config).run(image_paths).await
}
