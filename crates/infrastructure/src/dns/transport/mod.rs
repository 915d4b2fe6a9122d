mod registry;

pub use registry::TransportRegistry;
