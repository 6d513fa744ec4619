use super::*;

#[test]
fn field_descriptor_primitives() {
    assert_eq!("I".parse::<FieldDescriptor>().unwrap().0, FieldType::Int);
    assert_eq!("Z".parse::<FieldDescriptor>().unwrap().0, FieldType::Boolean);
}

#[test]
fn field_descriptor_object() {
    let FieldDescriptor(ty) = "Ljava/lang/String;".parse().unwrap();
    assert_eq!(ty, FieldType::Object("java/lang/String".to_owned()));
}

#[test]
fn field_descriptor_array() {
    let FieldDescriptor(ty) = "[[I".parse().unwrap();
    assert_eq!(ty, FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Int)))));
}

#[test]
fn method_descriptor_counts_parameters() {
    let desc: MethodDescriptor = "(Ljava/lang/String;I)V".parse().unwrap();
    assert_eq!(desc.parameter_count(), 2);
    assert_eq!(*desc.return_type(), MethodType::Void);
}

#[test]
fn method_descriptor_no_parameters() {
    let desc: MethodDescriptor = "()Ljava/security/Key;".parse().unwrap();
    assert_eq!(desc.parameter_count(), 0);
    assert_eq!(
        *desc.return_type(),
        MethodType::Some(FieldType::Object("java/security/Key".to_owned()))
    );
}

#[test]
fn method_descriptor_rejects_missing_paren() {
    assert!("Ljava/lang/String;)V".parse::<MethodDescriptor>().is_err());
}
