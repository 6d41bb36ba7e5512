mod navigation;
mod workflow;
