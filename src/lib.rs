//! wear-tile-mcp: MCP server for Wear OS tile development
//!
//! This library exposes a Model Context Protocol (MCP) server that lets a
//! coding agent drive a connected Wear OS device through adb: build and
//! install the sample tile app, manage the tile carousel, and capture
//! round-masked screenshots.

pub mod adb;
pub mod error;
pub mod exec;
pub mod mcp;
pub mod model;
pub mod screenshot;
