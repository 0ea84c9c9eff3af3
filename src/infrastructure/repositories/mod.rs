// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod discovered_url_repo_impl;
pub mod discovery_task_repo_impl;
