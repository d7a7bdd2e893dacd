// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod client;
pub mod crawler;

pub use client::{DirectoryClient, GraphObject, ODataPage};
pub use crawler::DirectoryCrawler;
