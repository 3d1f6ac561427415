fn main() {
    std::process::exit(image_cropper_lib::run());
}
