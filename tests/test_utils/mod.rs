pub use fracstim::test_utils::*;

pub fn init_logger() {
    let _ = env_logger::Builder::from_env("FRACSTIM_LOG")
        .is_test(true)
        .try_init();
}
