use crate::kitchen::Kitchen;
// app's shared state

pub struct AppState {
    pub kitchen: Kitchen,
}
