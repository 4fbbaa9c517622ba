//! Audio Adapter - 音频容器探测

mod symphonia_prober;

pub use symphonia_prober::SymphoniaProber;
