mod agent;
mod transform;
