// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 每个用例代表一个完整的业务流程：一次性发现、任务管理和结果查询
pub mod discovered_url_use_case;
pub mod discovery_run;
pub mod task_use_case;
