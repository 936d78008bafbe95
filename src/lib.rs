//! Thumbnail upload and retrieval service for Tubely videos.

pub mod auth;
pub mod config;
pub mod locks;
pub mod media;
pub mod storage;
pub mod videos;
pub mod web;
