mod classifier;
mod common;
mod fusion;
mod routing;
