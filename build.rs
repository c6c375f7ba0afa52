#[cfg(feature = "tauri")]
const COMMANDS: &[&str] = &[
    "load_saved",
    "add_new_to_gallery",
    "delete_picture",
    "delete_by_filepath",
    "photos",
];

fn main() {
    #[cfg(feature = "tauri")]
    tauri_plugin::Builder::new(COMMANDS).build();
}
