use crate::orders::StoreError;
use thiserror::Error;

/// 启动与运行期错误（请求级错误见 [`shared::error::AppError`]）
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("存储错误: {0}")]
    Storage(#[from] StoreError),

    #[error("目录数据导入失败: {0}")]
    Seed(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 服务器 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
