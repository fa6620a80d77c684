//! 内置 Action 总表
//!
//! 新增分类时在这里追加对应模块的 `actions()`。

use super::ActionEntry;
use crate::handlers;

pub fn entries() -> Vec<ActionEntry> {
    [
        handlers::save::actions(),
        handlers::pokemon::actions(),
        handlers::storage::actions(),
        handlers::items::actions(),
        handlers::pokedex::actions(),
        handlers::trainer::actions(),
        handlers::progress::actions(),
        handlers::communication::actions(),
        handlers::world::actions(),
        handlers::knowledge::actions(),
    ]
    .into_iter()
    .flatten()
    .collect()
}
